//! Submits buckets of mutations to the store and aggregates their failures.

use chrono::{DateTime, Utc};
use ledger_core::{DatagenError, Entity, EntityKind, MultiError, RowMutation, Store, StoreError};
use ledger_metrics::{track, MetricsSink};
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Applies batches through a [`Store`] with one bulk call per batch.
pub struct BulkApplier {
    store: Arc<dyn Store>,
    metrics: Arc<dyn MetricsSink>,
}

impl BulkApplier {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { store, metrics }
    }

    /// Apply `batch` to `table`.
    ///
    /// The call-level error and the per-row errors are merged into one
    /// [`MultiError`], call-level first. `Ok(())` means nothing failed.
    pub async fn apply(
        &self,
        table: &str,
        batch: Vec<RowMutation>,
    ) -> Result<(), MultiError<StoreError>> {
        let rows = batch.len();
        let start = Instant::now();
        let result = self.store.bulk_apply(table, batch).await;
        track(
            self.metrics.as_ref(),
            start,
            &format!("BulkApplier.apply[{table}]"),
        );

        match MultiError::merge(result.per_row, result.overall) {
            None => {
                debug!("Applied {} rows to '{}'", rows, table);
                Ok(())
            }
            Some(errors) => {
                error!(
                    "Bulk apply of {} rows to '{}' reported {} failures",
                    rows,
                    table,
                    errors.len()
                );
                Err(errors)
            }
        }
    }

    /// Apply the mutations generated for `bucket`, reporting failures as `PartialBatchFailure`.
    pub async fn apply_bucket(
        &self,
        table: &str,
        bucket: &Range<i64>,
        batch: Vec<RowMutation>,
    ) -> Result<(), DatagenError> {
        self.apply(table, batch)
            .await
            .map_err(|source| DatagenError::PartialBatchFailure {
                table: table.to_string(),
                start: bucket.start,
                end: bucket.end,
                source,
            })
    }

    /// Write `entities` generated for `bucket` to the table of their kind.
    pub async fn apply_entities<T: Entity>(
        &self,
        bucket: &Range<i64>,
        entities: &[T],
        written_at: DateTime<Utc>,
    ) -> Result<(), DatagenError> {
        let batch = entities.iter().map(|e| e.to_mutation(written_at)).collect();
        self.apply_bucket(T::KIND.table_name(), bucket, batch).await
    }

    /// Check that buckets of `bucket_size` rows of `kind` fit in one store call.
    pub fn check_bucket_size(&self, kind: EntityKind, bucket_size: i64) -> Result<(), DatagenError> {
        check_cells_per_call(
            kind,
            bucket_size,
            self.store.max_cells_per_call(),
            self.store.name(),
        )
    }
}

/// Check that buckets of `bucket_size` rows of `kind` stay within `limit` cells per call.
pub fn check_cells_per_call(
    kind: EntityKind,
    bucket_size: i64,
    limit: Option<usize>,
    backend: &str,
) -> Result<(), DatagenError> {
    let Some(limit) = limit else {
        return Ok(());
    };
    let cells = (bucket_size.max(0) as u128) * kind.column_count() as u128;
    if cells > limit as u128 {
        return Err(DatagenError::InvalidArgument(format!(
            "{kind} buckets of {bucket_size} rows need {cells} cells per call, but {backend} accepts at most {limit}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{Entity, User};
    use ledger_metrics::Metrics;
    use ledger_populate_memory::{FaultPlan, MemoryStore};

    fn users(ids: &[i64]) -> Vec<RowMutation> {
        let now = chrono::Utc::now();
        ids.iter()
            .map(|id| {
                User {
                    id: *id,
                    name: User::name_for_index(*id),
                    creation_time: now,
                }
                .to_mutation(now)
            })
            .collect()
    }

    async fn user_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .create_schema(&[EntityKind::User.table_definition()])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_apply_success() {
        let store = user_store().await;
        let metrics = Arc::new(Metrics::new());
        let applier = BulkApplier::new(store.clone(), metrics.clone());

        applier.apply("Users", users(&[1, 2, 3])).await.unwrap();

        assert_eq!(store.row_count("Users"), 3);
        assert_eq!(metrics.sample_count("BulkApplier.apply[Users]"), 1);
    }

    #[tokio::test]
    async fn test_overall_error_first_then_row_errors() {
        let store = user_store().await;
        store.set_faults(FaultPlan {
            reject_keys: [2, 4].into_iter().collect(),
            fail_apply_call: Some(1),
            ..Default::default()
        });
        let applier = BulkApplier::new(store, Arc::new(Metrics::new()));

        let errors = applier.apply("Users", users(&[1, 2, 3, 4])).await.unwrap_err();
        let errors = errors.into_inner();

        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], StoreError::Unavailable(_)));
        assert_eq!(
            errors[1],
            StoreError::RowRejected {
                key: 2,
                reason: "rejected by fault plan".to_string()
            }
        );
        assert!(matches!(errors[2], StoreError::RowRejected { key: 4, .. }));
    }

    #[tokio::test]
    async fn test_apply_bucket_wraps_partial_failure() {
        let store = user_store().await;
        store.set_faults(FaultPlan {
            reject_keys: [3].into_iter().collect(),
            ..Default::default()
        });
        let applier = BulkApplier::new(store.clone(), Arc::new(Metrics::new()));

        let err = applier
            .apply_bucket("Users", &(0..3), users(&[1, 2, 3]))
            .await
            .unwrap_err();

        match err {
            DatagenError::PartialBatchFailure {
                table,
                start,
                end,
                source,
            } => {
                assert_eq!(table, "Users");
                assert_eq!((start, end), (0, 3));
                assert_eq!(source.len(), 1);
            }
            other => panic!("Expected PartialBatchFailure, got {other:?}"),
        }
        // Rows that were not rejected are committed.
        assert_eq!(store.row_count("Users"), 2);
    }

    #[tokio::test]
    async fn test_apply_entities_writes_to_kind_table() {
        let store = user_store().await;
        let applier = BulkApplier::new(store.clone(), Arc::new(Metrics::new()));
        let now = chrono::Utc::now();
        let users: Vec<User> = (0..3)
            .map(|i| User {
                id: 100 + i,
                name: User::name_for_index(i),
                creation_time: now,
            })
            .collect();

        applier.apply_entities(&(0..3), &users, now).await.unwrap();

        assert_eq!(store.keys("Users"), vec![100, 101, 102]);
    }

    #[test]
    fn test_check_cells_per_call_without_limit() {
        assert!(check_cells_per_call(EntityKind::Transaction, i64::MAX, None, "memory").is_ok());
    }

    #[tokio::test]
    async fn test_check_bucket_size_against_store_limit() {
        let store = Arc::new(MemoryStore::new().with_max_cells_per_call(30));
        let applier = BulkApplier::new(store, Arc::new(Metrics::new()));

        assert!(applier.check_bucket_size(EntityKind::User, 10).is_ok());
        assert!(applier.check_bucket_size(EntityKind::Transaction, 6).is_ok());
        assert!(matches!(
            applier.check_bucket_size(EntityKind::Transaction, 7),
            Err(DatagenError::InvalidArgument(_))
        ));
    }
}
