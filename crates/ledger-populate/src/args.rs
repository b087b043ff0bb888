//! Common CLI argument definitions shared by all populators.

use clap::Args;
use ledger_core::{BucketSizes, DatagenConfig, DatagenError};
use ledger_generator::RunOptions;
use ledger_metrics::SummaryOptions;
use std::path::PathBuf;

/// Common arguments shared by all populators.
///
/// Every flag that is set overrides the matching value from `--config`.
#[derive(Args, Clone, Debug, Default)]
pub struct CommonPopulateArgs {
    /// Path to a YAML run configuration
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Random seed for deterministic generation (same seed = same data)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of users to generate
    #[arg(long)]
    pub user_count: Option<i64>,

    /// Number of transactions to generate
    #[arg(long)]
    pub transaction_count: Option<i64>,

    /// Users per bulk apply call
    #[arg(long)]
    pub user_bucket_size: Option<i64>,

    /// Transactions per bulk apply call
    #[arg(long)]
    pub transaction_bucket_size: Option<i64>,

    /// Create the tables without generating data
    #[arg(long, conflicts_with = "data_only")]
    pub schema_only: bool,

    /// Generate data into existing tables without creating them
    #[arg(long)]
    pub data_only: bool,

    /// Dry-run mode: validate configuration and print the bucket plan without touching the store
    #[arg(long)]
    pub dry_run: bool,

    /// Minimum samples an operation needs to appear in the latency summary
    #[arg(long, default_value = "100")]
    pub min_samples: usize,
}

impl CommonPopulateArgs {
    /// Load the config file (or defaults) and apply the command-line overrides.
    ///
    /// Bucket sizes left unset on both sides fall back to `backend_buckets`.
    pub fn resolve_config(
        &self,
        backend_buckets: BucketSizes,
    ) -> Result<DatagenConfig, DatagenError> {
        let mut config = match &self.config {
            Some(path) => DatagenConfig::from_file(path)?,
            None => DatagenConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(count) = self.user_count {
            config.user_count = count;
        }
        if let Some(count) = self.transaction_count {
            config.transaction_count = count;
        }
        if self.user_bucket_size.is_some() || self.transaction_bucket_size.is_some() {
            let mut buckets = config.bucket_sizes(backend_buckets);
            if let Some(size) = self.user_bucket_size {
                buckets.user = size;
            }
            if let Some(size) = self.transaction_bucket_size {
                buckets.transaction = size;
            }
            config.buckets = Some(buckets);
        }
        Ok(config)
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            schema_only: self.schema_only,
            data_only: self.data_only,
        }
    }

    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            min_samples: self.min_samples,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        common: CommonPopulateArgs,
    }

    fn parse(args: &[&str]) -> Result<CommonPopulateArgs, clap::Error> {
        let mut argv = vec!["test"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).map(|cli| cli.common)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.dry_run);
        assert_eq!(args.min_samples, 100);

        let config = args.resolve_config(BucketSizes::RELATIONAL).unwrap();
        assert_eq!(config, DatagenConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "seed: 1\nuser_count: 50\ntransaction_count: 500\nbuckets:\n  user: 7\n  transaction: 9"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = parse(&["--config", &path, "--seed", "99", "--user-bucket-size", "20"]).unwrap();
        let config = args.resolve_config(BucketSizes::RELATIONAL).unwrap();

        assert_eq!(config.seed, Some(99));
        assert_eq!(config.user_count, 50);
        assert_eq!(config.transaction_count, 500);
        assert_eq!(
            config.buckets,
            Some(BucketSizes {
                user: 20,
                transaction: 9
            })
        );
    }

    #[test]
    fn test_bucket_override_keeps_backend_default_for_other_kind() {
        let args = parse(&["--transaction-bucket-size", "250"]).unwrap();
        let config = args.resolve_config(BucketSizes::RELATIONAL).unwrap();

        assert_eq!(
            config.buckets,
            Some(BucketSizes {
                user: 5_000,
                transaction: 250
            })
        );
    }

    #[test]
    fn test_schema_only_conflicts_with_data_only() {
        assert!(parse(&["--schema-only", "--data-only"]).is_err());

        let args = parse(&["--data-only"]).unwrap();
        assert_eq!(
            args.run_options(),
            RunOptions {
                schema_only: false,
                data_only: true
            }
        );
    }

    #[test]
    fn test_summary_options() {
        let args = parse(&["--min-samples", "5"]).unwrap();
        let options = args.summary_options();
        assert_eq!(options.min_samples, 5);
        assert_eq!(options.ignored_samples, 10);
    }

    #[test]
    fn test_missing_config_file() {
        let args = parse(&["--config", "/nonexistent/ledger.yaml"]).unwrap();
        assert!(matches!(
            args.resolve_config(BucketSizes::WIDE_COLUMN),
            Err(DatagenError::Io(_))
        ));
    }
}
