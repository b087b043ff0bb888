//! Synthetic data generation for the ledger benchmark tables.
//!
//! This crate fills a [`Store`](ledger_core::Store) with companies, users,
//! and transactions. Large entity counts are split into buckets so each bulk
//! apply stays within the backend's per-call limits, and transactions only
//! reference companies and users read back from the store.
//!
//! # Architecture
//!
//! ```text
//!  DatagenRunner
//!       │
//!       ├── SchemaInitializer ──────────────► Store::create_schema
//!       ├── CompanyGenerator ──┐
//!       ├── UserGenerator ─────┼─ BucketPlan ─► BulkApplier ─► Store::bulk_apply
//!       └── TransactionGenerator ─┘
//!                 │
//!                 └── ReferenceSampler ──────► Store::scan_all_keys / query_ids
//! ```
//!
//! Every generator owns an [`IdAllocator`] seeded from its own stream of the
//! run seed, so a run is reproducible from its seed alone.
//!
//! # Example
//!
//! ```ignore
//! let runner = DatagenRunner::new(store, metrics, config, BucketSizes::RELATIONAL);
//! let report = runner.run(&mut std::io::stdout()).await?;
//! println!("seed={}", report.seed);
//! ```

pub mod apply;
pub mod bucket;
pub mod generators;
pub mod ids;
pub mod runner;
pub mod sampler;
pub mod schema;

// Re-exports for convenience
pub use apply::{check_cells_per_call, BulkApplier};
pub use bucket::{BucketPlan, Buckets};
pub use generators::transaction::TransactionSettings;
pub use generators::{
    CompanyGenerator, GenerateStats, GeneratorContext, TransactionGenerator, UserGenerator,
};
pub use ids::IdAllocator;
pub use runner::{DatagenRunner, RunOptions, RunPlan, RunReport};
pub use sampler::{ReferencePool, ReferenceSampler};
pub use schema::SchemaInitializer;
