//! Operation timing for the ledger data generation harness.
//!
//! Components receive a [`MetricsSink`] and report how long each named
//! operation took. The [`Metrics`] recorder keeps every sample and can
//! summarise them as latency distributions:
//!
//! ```text
//! UserGenerator.generateForBucket: samples=30, mean=12.40, median=11.93, pct75=13.01, pct99=18.77
//! ```

pub mod metrics;
pub mod summary;

pub use metrics::{track, Metrics, MetricsSink, NoopMetrics};
pub use summary::{LatencySummary, SummaryOptions};
