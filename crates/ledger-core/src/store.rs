//! Store capability trait implemented by every backend adapter.

use crate::entity::{RowMutation, TableDefinition};
use crate::error::StoreError;
use async_trait::async_trait;

/// Outcome of a single bulk apply call.
///
/// Backends that report per-row failures fill `per_row` with one entry per
/// submitted mutation (`None` for rows that were written). Backends that only
/// fail a call as a whole leave `per_row` empty and set `overall`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BulkApplyResult {
    pub per_row: Vec<Option<StoreError>>,
    pub overall: Option<StoreError>,
}

impl BulkApplyResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failed(err: StoreError) -> Self {
        Self {
            per_row: Vec::new(),
            overall: Some(err),
        }
    }
}

/// Trait for the storage operations the generator needs.
///
/// This trait abstracts the backend so that the same generation logic works with:
/// - the in-process wide-column store (`MemoryStore`)
/// - PostgreSQL (`PostgreSQLStore`)
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend label used in logs.
    fn name(&self) -> &str;

    /// Create the given tables.
    async fn create_schema(&self, tables: &[TableDefinition]) -> Result<(), StoreError>;

    /// Write a batch of mutations to `table` in one call.
    async fn bulk_apply(&self, table: &str, batch: Vec<RowMutation>) -> BulkApplyResult;

    /// Return every primary key currently stored in `table`, in key order.
    ///
    /// This is a full scan: memory use is proportional to the row count.
    async fn scan_all_keys(&self, table: &str) -> Result<Vec<i64>, StoreError>;

    /// Whether [`Store::query_ids`] is available.
    fn supports_sql(&self) -> bool {
        false
    }

    /// Fetch every id of `table` through a SQL query.
    async fn query_ids(&self, table: &str) -> Result<Vec<i64>, StoreError> {
        let _ = table;
        Err(StoreError::Unsupported("query_ids"))
    }

    /// Maximum number of cells (rows x columns) a single bulk apply may carry.
    fn max_cells_per_call(&self) -> Option<usize> {
        None
    }
}
