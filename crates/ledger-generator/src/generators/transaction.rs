//! Transaction generation.

use super::{GenerateStats, GeneratorContext};
use crate::bucket::BucketPlan;
use crate::ids::IdAllocator;
use crate::sampler::{ReferencePool, ReferenceSampler};
use chrono::Utc;
use ledger_core::{DatagenConfig, DatagenError, EntityKind, TimeWindow, Transaction};
use ledger_metrics::track;
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, info};

/// Parameters of transaction generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSettings {
    pub count: i64,
    pub bucket_size: i64,
    /// Id of the transaction at index 0.
    pub base_id: i64,
    pub time_window: TimeWindow,
    pub sub_second_jitter: bool,
}

impl TransactionSettings {
    pub fn from_config(config: &DatagenConfig, bucket_size: i64) -> Self {
        Self {
            count: config.transaction_count,
            bucket_size,
            base_id: config.transaction_base_id,
            time_window: config.transaction_time_window,
            sub_second_jitter: config.sub_second_jitter,
        }
    }
}

/// Inserts transactions between existing users at existing companies.
///
/// Foreign keys are sampled from the company and user keys read back from the
/// store, so every transaction references rows that exist. Ids are
/// `base_id + index`: increasing within a bucket and disjoint across buckets.
pub struct TransactionGenerator {
    ctx: GeneratorContext,
    settings: TransactionSettings,
    ids: IdAllocator,
}

impl TransactionGenerator {
    pub fn new(ctx: GeneratorContext, settings: TransactionSettings, ids: IdAllocator) -> Self {
        Self {
            ctx,
            settings,
            ids,
        }
    }

    /// Build the transactions for the indices in `bucket`.
    ///
    /// Sender and receiver are drawn independently and may be the same user.
    pub fn build_bucket(
        &mut self,
        bucket: Range<i64>,
        companies: &ReferencePool,
        users: &ReferencePool,
    ) -> Result<Vec<Transaction>, DatagenError> {
        let mut transactions = Vec::with_capacity((bucket.end - bucket.start).max(0) as usize);
        for index in bucket {
            let company_id = self.pick(companies)?;
            let from_user_id = self.pick(users)?;
            let to_user_id = self.pick(users)?;
            let time = if self.settings.sub_second_jitter {
                self.ids
                    .next_timestamp_with_jitter(&self.settings.time_window)
            } else {
                self.ids.next_timestamp(&self.settings.time_window)
            };

            transactions.push(Transaction {
                id: self.settings.base_id + index,
                company_id,
                from_user_id,
                to_user_id,
                time,
            });
        }
        Ok(transactions)
    }

    fn pick(&mut self, pool: &ReferencePool) -> Result<i64, DatagenError> {
        self.ids
            .pick(pool.ids())
            .ok_or(DatagenError::EmptyReferencePool { kind: pool.kind() })
    }

    pub async fn generate(&mut self) -> Result<GenerateStats, DatagenError> {
        let start = Instant::now();
        let result = self.generate_all().await;
        track(
            self.ctx.metrics.as_ref(),
            start,
            "TransactionGenerator.Generate",
        );
        result
    }

    async fn generate_all(&mut self) -> Result<GenerateStats, DatagenError> {
        let plan = BucketPlan::new(self.settings.count, self.settings.bucket_size)?;
        let applier = self.ctx.applier();
        applier.check_bucket_size(EntityKind::Transaction, self.settings.bucket_size)?;

        let sampler = ReferenceSampler::new(self.ctx.store.clone(), self.ctx.metrics.clone());
        let companies = sampler
            .fetch_all_keys(EntityKind::Company)
            .await?
            .require_non_empty()?;
        let users = sampler
            .fetch_all_keys(EntityKind::User)
            .await?
            .require_non_empty()?;

        info!(
            "Generating {} transactions in {} buckets (bucket size: {}) across {} companies and {} users",
            self.settings.count,
            plan.len(),
            self.settings.bucket_size,
            companies.len(),
            users.len()
        );

        let mut stats = GenerateStats::default();
        for bucket in plan {
            self.ctx.ensure_not_cancelled(EntityKind::Transaction)?;

            let bucket_start = Instant::now();
            let now = Utc::now();
            let transactions = self.build_bucket(bucket.clone(), &companies, &users)?;
            let rows = transactions.len() as u64;

            let result = applier
                .apply_entities(&bucket, &transactions, now)
                .await;
            track(
                self.ctx.metrics.as_ref(),
                bucket_start,
                "TransactionGenerator.generateForBucket",
            );
            result?;

            stats.rows += rows;
            stats.buckets += 1;
            debug!(
                "Transaction bucket [{}, {}) complete: {} transactions inserted so far",
                bucket.start, bucket.end, stats.rows
            );
        }

        Ok(stats)
    }
}
