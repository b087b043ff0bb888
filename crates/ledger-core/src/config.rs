//! Run configuration for data generation.

use crate::error::DatagenError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Number of users generated by default.
pub const DEFAULT_USER_COUNT: i64 = 200_000;
/// Number of transactions generated by default.
pub const DEFAULT_TRANSACTION_COUNT: i64 = 200_000_000;
/// Lowest transaction id. Transaction ids increase monotonically from here.
pub const DEFAULT_TRANSACTION_BASE_ID: i64 = 1_000_000_000_000_000_000;

/// Predefined company names.
pub const DEFAULT_COMPANY_NAMES: [&str; 10] = [
    "Amazon",
    "Apple",
    "Facebook",
    "Google",
    "IBM",
    "Intel",
    "Microsoft",
    "Netflix",
    "Oracle",
    "Visa",
];

/// Half-open time window `[start, end)` for transaction times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.start <= *ts && *ts < self.end
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            // 2019-01-01T00:00:00Z .. 2020-01-01T00:00:00Z
            start: DateTime::from_timestamp(1_546_300_800, 0).unwrap_or_default(),
            end: DateTime::from_timestamp(1_577_836_800, 0).unwrap_or_default(),
        }
    }
}

/// Rows per bulk apply call, per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSizes {
    pub user: i64,
    pub transaction: i64,
}

impl BucketSizes {
    /// Wide-column stores accept large bulk applies.
    pub const WIDE_COLUMN: BucketSizes = BucketSizes {
        user: 100_000,
        transaction: 100_000,
    };

    /// Relational stores cap the mutations per commit, so buckets stay small.
    pub const RELATIONAL: BucketSizes = BucketSizes {
        user: 5_000,
        transaction: 3_000,
    };
}

/// Configuration for one generation run.
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatagenConfig {
    /// Seed for the run. A random seed is drawn when absent.
    pub seed: Option<u64>,
    pub company_names: Vec<String>,
    pub user_count: i64,
    pub transaction_count: i64,
    pub transaction_base_id: i64,
    pub transaction_time_window: TimeWindow,
    /// Add random nanoseconds to transaction times.
    pub sub_second_jitter: bool,
    /// Bucket sizes; the backend's defaults apply when absent.
    pub buckets: Option<BucketSizes>,
}

impl Default for DatagenConfig {
    fn default() -> Self {
        Self {
            seed: None,
            company_names: DEFAULT_COMPANY_NAMES.iter().map(|s| s.to_string()).collect(),
            user_count: DEFAULT_USER_COUNT,
            transaction_count: DEFAULT_TRANSACTION_COUNT,
            transaction_base_id: DEFAULT_TRANSACTION_BASE_ID,
            transaction_time_window: TimeWindow::default(),
            sub_second_jitter: false,
            buckets: None,
        }
    }
}

impl DatagenConfig {
    /// Load config from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DatagenError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, DatagenError> {
        let config: DatagenConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Bucket sizes to use, falling back to `backend_default`.
    pub fn bucket_sizes(&self, backend_default: BucketSizes) -> BucketSizes {
        self.buckets.unwrap_or(backend_default)
    }

    /// Check the configuration for values generation cannot work with.
    pub fn validate(&self) -> Result<(), DatagenError> {
        if self.user_count < 0 {
            return Err(DatagenError::InvalidArgument(format!(
                "user_count must not be negative, got {}",
                self.user_count
            )));
        }
        if self.transaction_count < 0 {
            return Err(DatagenError::InvalidArgument(format!(
                "transaction_count must not be negative, got {}",
                self.transaction_count
            )));
        }
        if self.transaction_base_id < 0 {
            return Err(DatagenError::InvalidArgument(format!(
                "transaction_base_id must not be negative, got {}",
                self.transaction_base_id
            )));
        }
        if self
            .transaction_base_id
            .checked_add(self.transaction_count)
            .is_none()
        {
            return Err(DatagenError::InvalidArgument(format!(
                "transaction ids overflow: base {} + count {}",
                self.transaction_base_id, self.transaction_count
            )));
        }
        let window = &self.transaction_time_window;
        if window.start >= window.end {
            return Err(DatagenError::InvalidArgument(format!(
                "transaction time window is empty: [{}, {})",
                window.start, window.end
            )));
        }
        if let Some(buckets) = &self.buckets {
            if buckets.user <= 0 || buckets.transaction <= 0 {
                return Err(DatagenError::InvalidArgument(format!(
                    "bucket sizes must be positive, got user={} transaction={}",
                    buckets.user, buckets.transaction
                )));
            }
        }
        Ok(())
    }
}
