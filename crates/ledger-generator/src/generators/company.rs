//! Company generation.

use super::{GenerateStats, GeneratorContext};
use crate::ids::IdAllocator;
use chrono::{DateTime, Utc};
use ledger_core::{Company, DatagenError, EntityKind};
use ledger_metrics::track;
use std::time::Instant;
use tracing::info;

/// Inserts one company per configured name, in a single batch.
///
/// The company set is small and fixed, so no bucketing is needed.
pub struct CompanyGenerator {
    ctx: GeneratorContext,
    names: Vec<String>,
    ids: IdAllocator,
}

impl CompanyGenerator {
    pub fn new(ctx: GeneratorContext, names: Vec<String>, ids: IdAllocator) -> Self {
        Self { ctx, names, ids }
    }

    /// Build the company records, all created at `now`.
    pub fn build(&mut self, now: DateTime<Utc>) -> Vec<Company> {
        self.names
            .iter()
            .map(|name| Company {
                id: self.ids.next_id(),
                name: name.clone(),
                creation_time: now,
            })
            .collect()
    }

    pub async fn generate(&mut self) -> Result<GenerateStats, DatagenError> {
        let start = Instant::now();
        let result = self.generate_all().await;
        track(self.ctx.metrics.as_ref(), start, "CompanyGenerator.Generate");
        result
    }

    async fn generate_all(&mut self) -> Result<GenerateStats, DatagenError> {
        self.ctx.ensure_not_cancelled(EntityKind::Company)?;

        let now = Utc::now();
        let companies = self.build(now);
        let rows = companies.len() as u64;

        let bucket = 0..rows as i64;
        self.ctx
            .applier()
            .apply_entities(&bucket, &companies, now)
            .await?;

        info!("Inserted {} companies", rows);
        Ok(GenerateStats { rows, buckets: 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::Store;
    use ledger_metrics::{Metrics, NoopMetrics};
    use ledger_populate_memory::{FaultPlan, MemoryStore};
    use std::sync::Arc;

    fn names() -> Vec<String> {
        ["Acme", "Globex", "Initech"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    async fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .create_schema(&[EntityKind::Company.table_definition()])
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_build_one_company_per_name() {
        let ctx = GeneratorContext::new(Arc::new(MemoryStore::new()), Arc::new(NoopMetrics));
        let mut generator = CompanyGenerator::new(ctx, names(), IdAllocator::new(42));

        let now = Utc::now();
        let companies = generator.build(now);

        assert_eq!(
            companies.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["Acme", "Globex", "Initech"]
        );
        assert!(companies.iter().all(|c| c.id >= 0 && c.creation_time == now));
    }

    #[tokio::test]
    async fn test_generate_single_batch() {
        let store = store().await;
        let metrics = Arc::new(Metrics::new());
        let ctx = GeneratorContext::new(store.clone(), metrics.clone());
        let mut generator = CompanyGenerator::new(ctx, names(), IdAllocator::new(42));

        let stats = generator.generate().await.unwrap();

        assert_eq!(stats, GenerateStats { rows: 3, buckets: 1 });
        assert_eq!(store.row_count("Companies"), 3);
        assert_eq!(store.apply_calls(), 1);
        assert_eq!(metrics.sample_count("CompanyGenerator.Generate"), 1);
    }

    #[tokio::test]
    async fn test_generate_propagates_failure() {
        let store = store().await;
        store.set_faults(FaultPlan {
            fail_apply_call: Some(1),
            ..Default::default()
        });
        let metrics = Arc::new(Metrics::new());
        let ctx = GeneratorContext::new(store, metrics.clone());
        let mut generator = CompanyGenerator::new(ctx, names(), IdAllocator::new(42));

        let result = generator.generate().await;

        assert!(matches!(
            result,
            Err(DatagenError::PartialBatchFailure { .. })
        ));
        // Timed even when it fails.
        assert_eq!(metrics.sample_count("CompanyGenerator.Generate"), 1);
    }
}
