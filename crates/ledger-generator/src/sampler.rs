//! Materialises the keys of existing entities as foreign-key pools.

use ledger_core::{DatagenError, EntityKind, Store};
use ledger_metrics::{track, MetricsSink};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Every key of one entity kind, as stored when the pool was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePool {
    kind: EntityKind,
    ids: Vec<i64>,
}

impl ReferencePool {
    pub fn new(kind: EntityKind, ids: Vec<i64>) -> Self {
        Self { kind, ids }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    /// Fail with `EmptyReferencePool` if there is nothing to reference.
    pub fn require_non_empty(self) -> Result<Self, DatagenError> {
        if self.ids.is_empty() {
            Err(DatagenError::EmptyReferencePool { kind: self.kind })
        } else {
            Ok(self)
        }
    }
}

/// Reads back the full key set of a table.
///
/// SQL-capable stores are queried with `SELECT Id`, others are scanned. Either
/// way the whole key set is held in memory in key order, and an interrupted
/// read discards everything fetched so far.
pub struct ReferenceSampler {
    store: Arc<dyn Store>,
    metrics: Arc<dyn MetricsSink>,
}

impl ReferenceSampler {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { store, metrics }
    }

    /// Fetch every key currently stored for `kind`.
    pub async fn fetch_all_keys(&self, kind: EntityKind) -> Result<ReferencePool, DatagenError> {
        let table = kind.table_name();
        let start = Instant::now();

        let result = if self.store.supports_sql() {
            self.store.query_ids(table).await
        } else {
            self.store.scan_all_keys(table).await
        };
        track(
            self.metrics.as_ref(),
            start,
            &format!("ReferenceSampler.fetchAllKeys[{table}]"),
        );

        let mut ids = result
            .map_err(|e| DatagenError::unavailable(format!("Reading keys of '{table}'"), e))?;
        // Picks index into the pool, so its order must not depend on the backend.
        ids.sort_unstable();
        info!("Fetched {} keys from '{}'", ids.len(), table);

        Ok(ReferencePool::new(kind, ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ledger_core::{BulkApplyResult, Entity, RowMutation, StoreError, TableDefinition, User};
    use ledger_metrics::{Metrics, NoopMetrics};
    use ledger_populate_memory::{FaultPlan, MemoryStore};

    /// SQL store whose id query returns rows in insertion order.
    struct UnorderedSqlStore {
        ids: Vec<i64>,
    }

    #[async_trait]
    impl Store for UnorderedSqlStore {
        fn name(&self) -> &str {
            "unordered-sql"
        }

        async fn create_schema(&self, _tables: &[TableDefinition]) -> Result<(), StoreError> {
            Ok(())
        }

        async fn bulk_apply(&self, _table: &str, _batch: Vec<RowMutation>) -> BulkApplyResult {
            BulkApplyResult::ok()
        }

        async fn scan_all_keys(&self, _table: &str) -> Result<Vec<i64>, StoreError> {
            Err(StoreError::Unsupported("scan_all_keys"))
        }

        fn supports_sql(&self) -> bool {
            true
        }

        async fn query_ids(&self, _table: &str) -> Result<Vec<i64>, StoreError> {
            Ok(self.ids.clone())
        }
    }

    async fn store_with_users(ids: &[i64]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .create_schema(&[EntityKind::User.table_definition()])
            .await
            .unwrap();
        let now = chrono::Utc::now();
        let batch = ids
            .iter()
            .map(|id| {
                User {
                    id: *id,
                    name: format!("User-{id}"),
                    creation_time: now,
                }
                .to_mutation(now)
            })
            .collect();
        let result = store.bulk_apply("Users", batch).await;
        assert!(result.overall.is_none());
        store
    }

    #[tokio::test]
    async fn test_fetch_all_keys_in_key_order() {
        let store = store_with_users(&[30, 10, 20]).await;
        let metrics = Arc::new(Metrics::new());
        let sampler = ReferenceSampler::new(store, metrics.clone());

        let pool = sampler.fetch_all_keys(EntityKind::User).await.unwrap();

        assert_eq!(pool.kind(), EntityKind::User);
        assert_eq!(pool.ids(), &[10, 20, 30]);
        assert_eq!(metrics.sample_count("ReferenceSampler.fetchAllKeys[Users]"), 1);
    }

    #[tokio::test]
    async fn test_sql_query_result_is_put_in_key_order() {
        let store = Arc::new(UnorderedSqlStore {
            ids: vec![30, 10, 20],
        });
        let sampler = ReferenceSampler::new(store, Arc::new(NoopMetrics));

        let pool = sampler.fetch_all_keys(EntityKind::User).await.unwrap();

        assert_eq!(pool.ids(), &[10, 20, 30]);
    }

    #[tokio::test]
    async fn test_interrupted_scan_is_unavailable() {
        let store = store_with_users(&[1, 2]).await;
        store.set_faults(FaultPlan {
            fail_scans: true,
            ..Default::default()
        });
        let sampler = ReferenceSampler::new(store, Arc::new(Metrics::new()));

        let result = sampler.fetch_all_keys(EntityKind::User).await;
        assert!(matches!(result, Err(DatagenError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_missing_table_is_unavailable() {
        let store = Arc::new(MemoryStore::new());
        let sampler = ReferenceSampler::new(store, Arc::new(Metrics::new()));

        let result = sampler.fetch_all_keys(EntityKind::Company).await;
        assert!(matches!(result, Err(DatagenError::Unavailable { .. })));
    }

    #[test]
    fn test_require_non_empty() {
        let empty = ReferencePool::new(EntityKind::Company, Vec::new());
        assert!(matches!(
            empty.require_non_empty(),
            Err(DatagenError::EmptyReferencePool {
                kind: EntityKind::Company
            })
        ));

        let pool = ReferencePool::new(EntityKind::User, vec![5]);
        assert!(pool.require_non_empty().unwrap().contains(5));
    }
}
