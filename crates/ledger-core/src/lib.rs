//! Core types for the ledger data generation harness.
//!
//! This crate provides the foundational types shared by the generator and
//! every store adapter:
//!
//! - [`Company`], [`User`], [`Transaction`] - the generated entities
//! - [`RowMutation`] - a single row write handed to a [`Store`]
//! - [`TableDefinition`] - table layout used for schema creation
//! - [`DatagenConfig`] - run configuration loaded from YAML
//! - [`Store`] - the async capability every backend adapter implements
//! - [`MultiError`] - ordered aggregate of failures from a batch operation
//!
//! # Architecture
//!
//! ```text
//! ledger-core (this crate)
//!    │
//!    ├─── ledger-generator            (generation engine, depends on Store)
//!    │
//!    ├─── ledger-populate-memory      (implements Store, wide-column semantics)
//!    └─── ledger-populate-postgresql  (implements Store, relational semantics)
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod multi_error;
pub mod store;

// Re-exports for convenience
pub use config::{BucketSizes, DatagenConfig, TimeWindow};
pub use entity::{
    Company, Entity, EntityKind, FieldValue, RowMutation, TableDefinition, Transaction, User,
    DEFAULT_COLUMN_FAMILY,
};
pub use error::{DatagenError, StoreError};
pub use multi_error::MultiError;
pub use store::{BulkApplyResult, Store};
