//! Latency distribution summaries.

use std::fmt;
use std::time::Duration;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Controls which samples contribute to a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Names with fewer samples than this are omitted.
    pub min_samples: usize,
    /// Leading samples dropped as warm-up while the backend becomes hot.
    pub ignored_samples: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            min_samples: 100,
            ignored_samples: 10,
        }
    }
}

/// Latency distribution of one operation, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySummary {
    pub name: String,
    pub samples: usize,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p75_ms: f64,
    pub p99_ms: f64,
}

impl LatencySummary {
    /// Summarise `samples`, or `None` if there are fewer than `options.min_samples`.
    pub fn from_samples(
        name: &str,
        samples: &[Duration],
        options: &SummaryOptions,
    ) -> Option<Self> {
        if samples.is_empty() || samples.len() < options.min_samples {
            return None;
        }
        let skip = options.ignored_samples.min(samples.len() - 1);

        let mut millis: Vec<f64> = samples[skip..]
            .iter()
            .map(|d| d.as_nanos() as f64 / NANOS_PER_MILLI)
            .collect();
        millis.sort_by(|a, b| a.total_cmp(b));

        Some(Self {
            name: name.to_string(),
            samples: millis.len(),
            mean_ms: mean(&millis),
            median_ms: median(&millis),
            p75_ms: percentile(&millis, 75.0),
            p99_ms: percentile(&millis, 99.0),
        })
    }
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: samples={}, mean={:.2}, median={:.2}, pct75={:.2}, pct99={:.2}",
            self.name, self.samples, self.mean_ms, self.median_ms, self.p75_ms, self.p99_ms
        )
    }
}

fn mean(sorted: &[f64]) -> f64 {
    sorted.iter().sum::<f64>() / sorted.len() as f64
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Percentile of a non-empty sorted slice.
///
/// When `percent / 100 * len` lands on a whole rank that element is returned,
/// otherwise the two neighbouring ranks are averaged.
fn percentile(sorted: &[f64], percent: f64) -> f64 {
    let rank = percent / 100.0 * sorted.len() as f64;
    if rank < 1.0 {
        return sorted[0];
    }
    let whole = rank as usize;
    if rank.fract() == 0.0 {
        sorted[whole - 1]
    } else if whole < sorted.len() {
        (sorted[whole - 1] + sorted[whole]) / 2.0
    } else {
        sorted[sorted.len() - 1]
    }
}
