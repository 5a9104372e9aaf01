//! Outcome counts, throughput and latency summaries of pool runs.

pub mod reporter;

pub use reporter::{PerformanceReport, Reporter};

use core::time::Duration;

/// Latency distribution of one run, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    pub samples: usize,
    pub min: u64,
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub max: u64,
}

impl LatencySummary {
    /// Sorts `samples` once and reads every statistic off the sorted slice.
    ///
    /// Returns `None` when there is nothing to summarize.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(mut samples: Vec<u64>) -> Option<Self> {
        samples.sort_unstable();
        let (&min, &max) = (samples.first()?, samples.last()?);
        let total: u128 = samples.iter().map(|&sample| u128::from(sample)).sum();

        Some(Self {
            samples: samples.len(),
            min,
            mean: total as f64 / samples.len() as f64,
            p50: nearest_rank(&samples, 50),
            p95: nearest_rank(&samples, 95),
            p99: nearest_rank(&samples, 99),
            max,
        })
    }
}

/// Nearest-rank percentile over an ascending, non-empty slice.
fn nearest_rank(sorted: &[u64], percent: usize) -> u64 {
    let rank = (sorted.len() * percent).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

/// What a run produced, split by outcome.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    pub successes: usize,
    /// Calls that ran out of their wait budget
    pub timeouts: usize,
    pub failures: usize,
    pub duration: Duration,
    /// Operations per second over the whole run
    pub throughput: f64,
    pub latency: Option<LatencySummary>,
}

impl Metrics {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(successes: usize, timeouts: usize, failures: usize, duration: Duration) -> Self {
        let operations = successes + timeouts + failures;
        let secs = duration.as_secs_f64();
        Self {
            successes,
            timeouts,
            failures,
            duration,
            throughput: if secs > 0.0 { operations as f64 / secs } else { 0.0 },
            latency: None,
        }
    }

    #[must_use]
    pub fn with_latencies(mut self, samples: Vec<u64>) -> Self {
        self.latency = LatencySummary::from_samples(samples);
        self
    }

    #[must_use]
    pub const fn operations(&self) -> usize {
        self.successes + self.timeouts + self.failures
    }

    /// Share of operations that timed out, `0.0` for an empty run.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn timeout_rate(&self) -> f64 {
        match self.operations() {
            0 => 0.0,
            total => self.timeouts as f64 / total as f64,
        }
    }
}
