//! Metrics sink and the in-process recorder.

use crate::summary::{LatencySummary, SummaryOptions};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Receives operation timings.
pub trait MetricsSink: Send + Sync {
    /// Record that the operation `name` took `elapsed`.
    fn record(&self, name: &str, elapsed: Duration);
}

/// Record the time elapsed since `start` under `name`.
pub fn track(sink: &dyn MetricsSink, start: Instant, name: &str) {
    sink.record(name, start.elapsed());
}

/// Sink that discards every sample.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record(&self, _name: &str, _elapsed: Duration) {}
}

/// Keeps every recorded duration, grouped by operation name.
#[derive(Debug, Default)]
pub struct Metrics {
    durations_by_name: Mutex<HashMap<String, Vec<Duration>>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples recorded for `name`.
    pub fn sample_count(&self, name: &str) -> usize {
        self.lock().get(name).map(Vec::len).unwrap_or(0)
    }

    /// Names with at least one sample, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Summaries for every name with enough samples, sorted by name.
    pub fn summaries(&self, options: &SummaryOptions) -> Vec<LatencySummary> {
        let durations = self.lock();
        let mut summaries: Vec<LatencySummary> = durations
            .iter()
            .filter_map(|(name, samples)| LatencySummary::from_samples(name, samples, options))
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Human-readable summary, one line per operation name.
    pub fn summarize(&self, options: &SummaryOptions) -> String {
        self.summaries(options)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Duration>>> {
        // A poisoned map still holds valid samples.
        self.durations_by_name
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MetricsSink for Metrics {
    fn record(&self, name: &str, elapsed: Duration) {
        let mut durations = self.lock();
        let samples = durations.entry(name.to_string()).or_default();
        samples.push(elapsed);
        debug!("({}) {} took {:?}", samples.len(), name, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_groups_by_name() {
        let metrics = Metrics::new();
        metrics.record("a", Duration::from_millis(1));
        metrics.record("a", Duration::from_millis(2));
        metrics.record("b", Duration::from_millis(3));

        assert_eq!(metrics.sample_count("a"), 2);
        assert_eq!(metrics.sample_count("b"), 1);
        assert_eq!(metrics.sample_count("c"), 0);
        assert_eq!(metrics.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_track_records_elapsed() {
        let metrics = Metrics::new();
        let start = Instant::now();
        track(&metrics, start, "op");
        assert_eq!(metrics.sample_count("op"), 1);
    }

    #[test]
    fn test_summarize_sorted_and_filtered() {
        let metrics = Metrics::new();
        for ms in 1..=4 {
            metrics.record("z.op", Duration::from_millis(ms));
            metrics.record("a.op", Duration::from_millis(ms));
        }
        metrics.record("rare", Duration::from_millis(1));

        let options = SummaryOptions {
            min_samples: 2,
            ignored_samples: 0,
        };
        let summary = metrics.summarize(&options);
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("a.op: samples=4"));
        assert!(lines[1].starts_with("z.op: samples=4"));
    }

    #[test]
    fn test_noop_metrics() {
        let sink = NoopMetrics;
        sink.record("anything", Duration::from_secs(1));
    }
}
