//! High-contention runs over a single pool operation.
//!
//! Every call is timed and sorted by outcome: `Ok`, [`PoolError::Timeout`]
//! or any other error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use tickets_core::{PoolError, PoolResult};

use crate::metrics::Metrics;

pub mod config;

pub use config::StressConfig;

/// Upper bound on latency slots reserved up front.
const PREALLOCATED_SAMPLES: usize = 1 << 16;

/// Outcome tallies and latency samples left by a [`StressHarness`] run.
#[derive(Debug, Clone)]
pub struct StressResult {
    pub successes: usize,
    /// Calls that gave up with [`PoolError::Timeout`]
    pub timeouts: usize,
    /// Calls that failed with any other error
    pub failures: usize,
    pub duration: Duration,
    pub thread_count: usize,
    /// One sample per call, in nanoseconds, unordered
    pub latencies: Vec<u64>,
}

impl StressResult {
    #[must_use]
    pub const fn total_operations(&self) -> usize {
        self.successes + self.timeouts + self.failures
    }

    /// Fraction of calls that returned `Ok`, `0.0` when nothing ran.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        match self.total_operations() {
            0 => 0.0,
            total => self.successes as f64 / total as f64,
        }
    }

    #[must_use]
    pub fn operations_per_second(&self) -> f64 {
        Metrics::new(self.successes, self.timeouts, self.failures, self.duration).throughput
    }

    #[must_use]
    pub fn to_metrics(&self) -> Metrics {
        Metrics::new(self.successes, self.timeouts, self.failures, self.duration)
            .with_latencies(self.latencies.clone())
    }
}

/// Shared outcome counters, one per [`PoolResult`] class.
#[derive(Debug, Default)]
struct Tally {
    successes: AtomicUsize,
    timeouts: AtomicUsize,
    failures: AtomicUsize,
}

impl Tally {
    fn record(&self, outcome: &PoolResult<()>) {
        let counter = match outcome {
            Ok(()) => &self.successes,
            Err(PoolError::Timeout) => &self.timeouts,
            Err(_) => &self.failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Drives one pool operation from many threads at once.
#[derive(Debug)]
pub struct StressHarness {
    config: StressConfig,
}

impl StressHarness {
    #[must_use]
    pub const fn new(config: StressConfig) -> Self {
        Self { config }
    }

    /// Calls `operation(thread_index, iteration)` from every thread until its
    /// iterations run out or the configured duration has passed.
    ///
    /// Threads are scoped to the call, so `operation` may borrow the pool.
    ///
    /// # Examples
    ///
    /// ```
    /// use tickets_core::Strategy;
    /// use tickets_testing::stress::{StressConfig, StressHarness};
    ///
    /// let config = StressConfig::new().threads(4).iterations(25).capacity(100);
    /// let pool = Strategy::Monitor.build_with(config.pool_config()).expect("should build");
    ///
    /// let result = StressHarness::new(config).run(|thread_id, iteration| {
    ///     let name = format!("Event-{thread_id}-{iteration}");
    ///     pool.add(pool.create_ticket(&name, "Vendor", "Hall", 10.0))
    /// });
    ///
    /// assert_eq!(result.successes, 100);
    /// assert_eq!(pool.size(), 100);
    /// ```
    pub fn run<F>(self, operation: F) -> StressResult
    where
        F: Fn(usize, usize) -> PoolResult<()> + Sync,
    {
        let threads = self.config.get_thread_count();
        let iterations = self.config.get_iterations();
        let began = Instant::now();
        let cutoff = self.config.get_duration().map(|limit| began + limit);

        let tally = Tally::default();
        let samples = Mutex::new(Vec::with_capacity(
            self.config.total_operations().min(PREALLOCATED_SAMPLES),
        ));

        thread::scope(|scope| {
            let workers: Vec<_> = (0..threads)
                .map(|thread_index| {
                    let (operation, tally, samples) = (&operation, &tally, &samples);
                    scope.spawn(move || {
                        let mut local = Vec::with_capacity(iterations.min(PREALLOCATED_SAMPLES));
                        for iteration in 0..iterations {
                            if cutoff.is_some_and(|at| Instant::now() >= at) {
                                break;
                            }

                            let called = Instant::now();
                            let outcome = operation(thread_index, iteration);
                            local.push(
                                u64::try_from(called.elapsed().as_nanos()).unwrap_or(u64::MAX),
                            );
                            tally.record(&outcome);
                        }

                        match samples.lock() {
                            Ok(mut all) => all.append(&mut local),
                            Err(poisoned) => poisoned.into_inner().append(&mut local),
                        }
                    })
                })
                .collect();

            for worker in workers {
                if worker.join().is_err() {
                    tracing::error!("Stress thread panicked, its samples are lost");
                }
            }
        });

        StressResult {
            successes: tally.successes.into_inner(),
            timeouts: tally.timeouts.into_inner(),
            failures: tally.failures.into_inner(),
            duration: began.elapsed(),
            thread_count: threads,
            latencies: samples
                .into_inner()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        }
    }
}
