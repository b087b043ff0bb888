//! Sequential generation run: schema, then companies, users, and transactions.

use crate::bucket::BucketPlan;
use crate::generators::transaction::TransactionSettings;
use crate::generators::{
    CompanyGenerator, GenerateStats, GeneratorContext, TransactionGenerator, UserGenerator,
};
use crate::ids::IdAllocator;
use crate::schema::SchemaInitializer;
use ledger_core::{BucketSizes, DatagenConfig, DatagenError, EntityKind, Store};
use ledger_metrics::MetricsSink;
use std::fmt;
use std::io::Write;
use std::ops::Range;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Which parts of a run to execute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Create the tables and stop.
    pub schema_only: bool,
    /// Skip table creation; the tables must already exist.
    pub data_only: bool,
}

/// What a completed run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Seed the run used. Passing it back in reproduces the run.
    pub seed: u64,
    pub schema_created: bool,
    pub companies: GenerateStats,
    pub users: GenerateStats,
    pub transactions: GenerateStats,
}

/// Bucket layout of a run, computed without touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub seed: u64,
    pub companies: usize,
    pub users: BucketPlan,
    pub transactions: BucketPlan,
    pub transaction_ids: Range<i64>,
}

impl RunPlan {
    /// Validate `config` and lay out its buckets. Needs no store.
    pub fn new(
        config: &DatagenConfig,
        seed: u64,
        buckets: BucketSizes,
        options: RunOptions,
    ) -> Result<Self, DatagenError> {
        config.validate()?;
        if options.schema_only && options.data_only {
            return Err(DatagenError::InvalidArgument(
                "schema-only and data-only are mutually exclusive".to_string(),
            ));
        }
        let base = config.transaction_base_id;
        Ok(RunPlan {
            seed,
            companies: config.company_names.len(),
            users: BucketPlan::new(config.user_count, buckets.user)?,
            transactions: BucketPlan::new(config.transaction_count, buckets.transaction)?,
            transaction_ids: base..base + config.transaction_count,
        })
    }
}

impl fmt::Display for RunPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Seed: {}", self.seed)?;
        writeln!(f, "Companies: {} rows in 1 bucket", self.companies)?;
        writeln!(
            f,
            "Users: {} rows in {} buckets of up to {}",
            self.users.total(),
            self.users.len(),
            self.users.bucket_size()
        )?;
        write!(
            f,
            "Transactions: {} rows in {} buckets of up to {}, ids [{}, {})",
            self.transactions.total(),
            self.transactions.len(),
            self.transactions.bucket_size(),
            self.transaction_ids.start,
            self.transaction_ids.end
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Schema,
    Entities(EntityKind),
}

impl Stage {
    fn success_line(&self) -> String {
        match self {
            Stage::Schema => "Created schema".to_string(),
            Stage::Entities(kind) => format!("Inserted {kind}"),
        }
    }

    fn action(&self) -> String {
        match self {
            Stage::Schema => "instantiate schema".to_string(),
            Stage::Entities(kind) => format!("generate {kind}"),
        }
    }
}

/// Drives one generation run against a store.
///
/// Stages run strictly in order and each bucket waits for the previous one:
/// transactions sample the company and user keys the earlier stages wrote.
pub struct DatagenRunner {
    ctx: GeneratorContext,
    config: DatagenConfig,
    buckets: BucketSizes,
    options: RunOptions,
    seed: u64,
}

impl DatagenRunner {
    /// Create a runner. `backend_buckets` applies when the config sets no bucket sizes.
    pub fn new(
        store: Arc<dyn Store>,
        metrics: Arc<dyn MetricsSink>,
        config: DatagenConfig,
        backend_buckets: BucketSizes,
    ) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let buckets = config.bucket_sizes(backend_buckets);
        Self {
            ctx: GeneratorContext::new(store, metrics),
            config,
            buckets,
            options: RunOptions::default(),
            seed,
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop the run at the next bucket boundary once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.ctx = self.ctx.with_cancellation(cancel);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn bucket_sizes(&self) -> BucketSizes {
        self.buckets
    }

    /// Validate the configuration and lay out the buckets.
    pub fn plan(&self) -> Result<RunPlan, DatagenError> {
        RunPlan::new(&self.config, self.seed, self.buckets, self.options)
    }

    /// Run every stage, writing one progress line per finished stage to `out`.
    ///
    /// The first failure stops the run. Buckets already applied stay in the store.
    pub async fn run<W: Write + Send>(&self, out: &mut W) -> Result<RunReport, DatagenError> {
        self.plan()?;
        info!(
            "Starting data generation on {} (seed={})",
            self.ctx.store.name(),
            self.seed
        );

        let mut report = RunReport {
            seed: self.seed,
            ..Default::default()
        };

        if !self.options.data_only {
            let schema = SchemaInitializer::new(self.ctx.store.clone());
            finish_stage(out, Stage::Schema, schema.create_tables().await)?;
            report.schema_created = true;
        }
        if self.options.schema_only {
            return Ok(report);
        }

        let mut companies = CompanyGenerator::new(
            self.ctx.clone(),
            self.config.company_names.clone(),
            IdAllocator::for_kind(self.seed, EntityKind::Company),
        );
        report.companies = finish_stage(
            out,
            Stage::Entities(EntityKind::Company),
            companies.generate().await,
        )?;

        let mut users = UserGenerator::new(
            self.ctx.clone(),
            self.config.user_count,
            self.buckets.user,
            IdAllocator::for_kind(self.seed, EntityKind::User),
        );
        report.users = finish_stage(
            out,
            Stage::Entities(EntityKind::User),
            users.generate().await,
        )?;

        let mut transactions = TransactionGenerator::new(
            self.ctx.clone(),
            TransactionSettings::from_config(&self.config, self.buckets.transaction),
            IdAllocator::for_kind(self.seed, EntityKind::Transaction),
        );
        report.transactions = finish_stage(
            out,
            Stage::Entities(EntityKind::Transaction),
            transactions.generate().await,
        )?;

        info!(
            "Data generation complete: {} companies, {} users, {} transactions",
            report.companies.rows, report.users.rows, report.transactions.rows
        );
        Ok(report)
    }
}

fn finish_stage<W: Write, T>(
    out: &mut W,
    stage: Stage,
    result: Result<T, DatagenError>,
) -> Result<T, DatagenError> {
    match result {
        Ok(value) => {
            writeln!(out, "{}", stage.success_line())?;
            Ok(value)
        }
        Err(e) => {
            warn!("Aborting run: failed to {}", stage.action());
            if let Err(io) = writeln!(out, "Failed to {}: {}", stage.action(), e) {
                warn!("Failed to write progress output: {}", io);
            }
            Err(e)
        }
    }
}
