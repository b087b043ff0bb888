//! Memory-backed implementation of the store capability.

use async_trait::async_trait;
use ledger_core::{BulkApplyResult, RowMutation, Store, StoreError, TableDefinition};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Failures to inject into store calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Rows with these keys are rejected individually.
    pub reject_keys: HashSet<i64>,
    /// Fail the bulk apply call with this 1-based number as a whole.
    pub fail_apply_call: Option<usize>,
    /// Fail every key scan as if the stream were interrupted.
    pub fail_scans: bool,
}

#[derive(Debug)]
struct MemoryTable {
    column_family: String,
    rows: BTreeMap<i64, RowMutation>,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, MemoryTable>,
    faults: FaultPlan,
    apply_calls: usize,
    batch_sizes: HashMap<String, Vec<usize>>,
}

/// Wide-column store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    max_cells_per_call: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the cells (rows x columns) one bulk apply may carry.
    pub fn with_max_cells_per_call(mut self, limit: usize) -> Self {
        self.max_cells_per_call = Some(limit);
        self
    }

    /// Replace the injected failures.
    pub fn set_faults(&self, faults: FaultPlan) {
        self.lock().faults = faults;
    }

    /// Names of the created tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Column family of `table`, if it exists.
    pub fn column_family(&self, table: &str) -> Option<String> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.column_family.clone())
    }

    /// Number of rows in `table`; zero if it does not exist.
    pub fn row_count(&self, table: &str) -> usize {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    /// Keys of `table` in key order.
    pub fn keys(&self, table: &str) -> Vec<i64> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Stored rows of `table` in key order.
    pub fn rows(&self, table: &str) -> Vec<RowMutation> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of bulk apply calls received, failed ones included.
    pub fn apply_calls(&self) -> usize {
        self.lock().apply_calls
    }

    /// Size of every batch submitted to `table`, in submission order.
    pub fn batch_sizes(&self, table: &str) -> Vec<usize> {
        self.lock()
            .batch_sizes
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_schema(&self, tables: &[TableDefinition]) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some(existing) = tables.iter().find(|t| state.tables.contains_key(&t.name)) {
            return Err(StoreError::TableExists(existing.name.clone()));
        }
        for table in tables {
            debug!(
                "Creating table '{}' with column family '{}'",
                table.name, table.column_family
            );
            state.tables.insert(
                table.name.clone(),
                MemoryTable {
                    column_family: table.column_family.to_string(),
                    rows: BTreeMap::new(),
                },
            );
        }
        Ok(())
    }

    async fn bulk_apply(&self, table: &str, batch: Vec<RowMutation>) -> BulkApplyResult {
        let mut state = self.lock();
        state.apply_calls += 1;
        let call = state.apply_calls;
        state
            .batch_sizes
            .entry(table.to_string())
            .or_default()
            .push(batch.len());

        if !state.tables.contains_key(table) {
            return BulkApplyResult::failed(StoreError::TableNotFound(table.to_string()));
        }

        let call_failed = state.faults.fail_apply_call == Some(call);
        let rejected: Vec<bool> = batch
            .iter()
            .map(|m| state.faults.reject_keys.contains(&m.key))
            .collect();

        let overall = call_failed
            .then(|| StoreError::Unavailable(format!("injected failure on apply call {call}")));
        let per_row = if rejected.iter().any(|r| *r) {
            batch
                .iter()
                .zip(&rejected)
                .map(|(m, rejected)| {
                    rejected.then(|| StoreError::RowRejected {
                        key: m.key,
                        reason: "rejected by fault plan".to_string(),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        if !call_failed {
            let Some(rows) = state.tables.get_mut(table).map(|t| &mut t.rows) else {
                return BulkApplyResult::failed(StoreError::TableNotFound(table.to_string()));
            };
            for (mutation, rejected) in batch.into_iter().zip(rejected) {
                if rejected {
                    continue;
                }
                match rows.get_mut(&mutation.key) {
                    Some(existing) => upsert_cells(existing, mutation),
                    None => {
                        rows.insert(mutation.key, mutation);
                    }
                }
            }
        }

        BulkApplyResult { per_row, overall }
    }

    async fn scan_all_keys(&self, table: &str) -> Result<Vec<i64>, StoreError> {
        let state = self.lock();
        if state.faults.fail_scans {
            return Err(StoreError::Unavailable(format!(
                "scan of '{table}' interrupted"
            )));
        }
        state
            .tables
            .get(table)
            .map(|t| t.rows.keys().copied().collect())
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    fn max_cells_per_call(&self) -> Option<usize> {
        self.max_cells_per_call
    }
}

/// Overwrite the cells present in `update`, keeping the others.
fn upsert_cells(existing: &mut RowMutation, update: RowMutation) {
    for (column, value) in update.cells {
        match existing.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(cell) => cell.1 = value,
            None => existing.cells.push((column, value)),
        }
    }
    existing.timestamp = update.timestamp;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ledger_core::{EntityKind, FieldValue};

    fn mutation(key: i64, name: &str) -> RowMutation {
        RowMutation::new(key, Utc::now()).set("Name", FieldValue::Text(name.to_string()))
    }

    async fn users_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_schema(&[EntityKind::User.table_definition()])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_schema_uses_column_family() {
        let store = users_store().await;
        assert_eq!(store.table_names(), vec!["Users"]);
        assert_eq!(store.column_family("Users").as_deref(), Some("cf"));
    }

    #[tokio::test]
    async fn test_bulk_apply_and_scan_in_key_order() {
        let store = users_store().await;

        let result = store
            .bulk_apply("Users", vec![mutation(3, "c"), mutation(1, "a"), mutation(2, "b")])
            .await;

        assert_eq!(result, BulkApplyResult::ok());
        assert_eq!(store.scan_all_keys("Users").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(store.apply_calls(), 1);
        assert_eq!(store.batch_sizes("Users"), vec![3]);
    }

    #[tokio::test]
    async fn test_rewrite_upserts_cells() {
        let store = users_store().await;
        store.bulk_apply("Users", vec![mutation(1, "old")]).await;
        store.bulk_apply("Users", vec![mutation(1, "new")]).await;

        let rows = store.rows("Users");
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("Name"),
            Some(&FieldValue::Text("new".to_string()))
        );
    }

    #[tokio::test]
    async fn test_rejected_rows_reported_per_row() {
        let store = users_store().await;
        store.set_faults(FaultPlan {
            reject_keys: [2].into_iter().collect(),
            ..Default::default()
        });

        let result = store
            .bulk_apply("Users", vec![mutation(1, "a"), mutation(2, "b")])
            .await;

        assert!(result.overall.is_none());
        assert_eq!(result.per_row.len(), 2);
        assert!(result.per_row[0].is_none());
        assert!(matches!(
            result.per_row[1],
            Some(StoreError::RowRejected { key: 2, .. })
        ));
        assert_eq!(store.keys("Users"), vec![1]);
    }

    #[tokio::test]
    async fn test_failed_call_writes_nothing() {
        let store = users_store().await;
        store.set_faults(FaultPlan {
            fail_apply_call: Some(1),
            ..Default::default()
        });

        let result = store.bulk_apply("Users", vec![mutation(1, "a")]).await;

        assert!(matches!(result.overall, Some(StoreError::Unavailable(_))));
        assert_eq!(store.row_count("Users"), 0);

        // Only the configured call fails.
        let result = store.bulk_apply("Users", vec![mutation(1, "a")]).await;
        assert_eq!(result, BulkApplyResult::ok());
    }

    #[tokio::test]
    async fn test_missing_table() {
        let store = MemoryStore::new();

        let result = store.bulk_apply("Users", vec![mutation(1, "a")]).await;
        assert_eq!(
            result.overall,
            Some(StoreError::TableNotFound("Users".to_string()))
        );
        assert!(matches!(
            store.scan_all_keys("Users").await,
            Err(StoreError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_existing_table_fails_atomically() {
        let store = users_store().await;

        let result = store
            .create_schema(&[
                EntityKind::Company.table_definition(),
                EntityKind::User.table_definition(),
            ])
            .await;

        assert_eq!(result, Err(StoreError::TableExists("Users".to_string())));
        assert_eq!(store.table_names(), vec!["Users"]);
    }

    #[tokio::test]
    async fn test_query_ids_unsupported() {
        let store = users_store().await;
        assert!(!store.supports_sql());
        assert_eq!(
            store.query_ids("Users").await,
            Err(StoreError::Unsupported("query_ids"))
        );
    }
}
