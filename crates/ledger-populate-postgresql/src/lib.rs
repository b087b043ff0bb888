//! PostgreSQL store for the ledger data generation harness.
//!
//! [`PostgreSQLStore`] implements [`ledger_core::Store`] for a relational
//! backend: tables are created with DDL, each bulk apply is one multi-row
//! `INSERT` that succeeds or fails as a whole, and reference keys are read
//! with `SELECT "Id"`.

pub mod args;
pub mod error;
pub mod insert;
pub mod store;

pub use args::PostgreSQLPopulateArgs;
pub use error::PostgreSQLStoreError;
pub use insert::MAX_BIND_PARAMETERS;
pub use store::PostgreSQLStore;
