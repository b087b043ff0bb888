//! User generation.

use super::{GenerateStats, GeneratorContext};
use crate::bucket::BucketPlan;
use crate::ids::IdAllocator;
use chrono::{DateTime, Utc};
use ledger_core::{DatagenError, EntityKind, User};
use ledger_metrics::track;
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, info};

/// Inserts `user_count` users, one bulk apply per bucket.
pub struct UserGenerator {
    ctx: GeneratorContext,
    user_count: i64,
    bucket_size: i64,
    ids: IdAllocator,
}

impl UserGenerator {
    pub fn new(ctx: GeneratorContext, user_count: i64, bucket_size: i64, ids: IdAllocator) -> Self {
        Self {
            ctx,
            user_count,
            bucket_size,
            ids,
        }
    }

    /// Build the users for the indices in `bucket`, all created at `now`.
    ///
    /// The index only names the user; the id is drawn at random.
    pub fn build_bucket(&mut self, bucket: Range<i64>, now: DateTime<Utc>) -> Vec<User> {
        bucket
            .map(|index| User {
                id: self.ids.next_id(),
                name: User::name_for_index(index),
                creation_time: now,
            })
            .collect()
    }

    pub async fn generate(&mut self) -> Result<GenerateStats, DatagenError> {
        let start = Instant::now();
        let result = self.generate_all().await;
        track(self.ctx.metrics.as_ref(), start, "UserGenerator.Generate");
        result
    }

    async fn generate_all(&mut self) -> Result<GenerateStats, DatagenError> {
        let plan = BucketPlan::new(self.user_count, self.bucket_size)?;
        let applier = self.ctx.applier();
        applier.check_bucket_size(EntityKind::User, self.bucket_size)?;

        info!(
            "Generating {} users in {} buckets (bucket size: {})",
            self.user_count,
            plan.len(),
            self.bucket_size
        );

        let mut stats = GenerateStats::default();
        for bucket in plan {
            self.ctx.ensure_not_cancelled(EntityKind::User)?;

            let bucket_start = Instant::now();
            let now = Utc::now();
            let users = self.build_bucket(bucket.clone(), now);
            let rows = users.len() as u64;

            let result = applier.apply_entities(&bucket, &users, now).await;
            track(
                self.ctx.metrics.as_ref(),
                bucket_start,
                "UserGenerator.generateForBucket",
            );
            result?;

            stats.rows += rows;
            stats.buckets += 1;
            debug!(
                "User bucket [{}, {}) complete: {} users inserted so far",
                bucket.start, bucket.end, stats.rows
            );
        }

        Ok(stats)
    }
}
