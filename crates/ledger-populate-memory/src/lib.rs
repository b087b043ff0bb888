//! In-process wide-column store.
//!
//! [`MemoryStore`] implements [`ledger_core::Store`] with the semantics of a
//! wide-column backend: tables hold one column family, rows are kept in key
//! order, writes upsert individual cells, and a bulk apply reports failures
//! per row. A [`FaultPlan`] can reject rows or fail calls so callers can
//! exercise their error paths.

pub mod store;

pub use store::{FaultPlan, MemoryStore};
