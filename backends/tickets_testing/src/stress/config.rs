use core::time::Duration;

use tickets_core::PoolConfig;

/// How hard and how long a [`super::StressHarness`] leans on a pool, plus
/// the shape of the pools scenarios build for it.
///
/// Starts at 4 threads doing 1000 calls each with no time limit, against
/// pools of capacity 100 that wait at most 50ms.
#[derive(Debug, Clone, Copy)]
pub struct StressConfig {
    threads: usize,
    calls_per_thread: usize,
    time_limit: Option<Duration>,
    pool: PoolConfig,
}

impl StressConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threads: 4,
            calls_per_thread: 1000,
            time_limit: None,
            pool: PoolConfig::new(100).wait_timeout(Duration::from_millis(50)),
        }
    }

    #[must_use]
    pub const fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub const fn iterations(mut self, calls_per_thread: usize) -> Self {
        self.calls_per_thread = calls_per_thread;
        self
    }

    /// Stops every thread at its next call once `limit` has passed.
    #[must_use]
    pub const fn duration(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.pool = PoolConfig::new(capacity).wait_timeout(self.pool.get_wait_timeout());
        self
    }

    #[must_use]
    pub const fn wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.pool = self.pool.wait_timeout(wait_timeout);
        self
    }

    #[must_use]
    pub const fn get_thread_count(&self) -> usize {
        self.threads
    }

    #[must_use]
    pub const fn get_iterations(&self) -> usize {
        self.calls_per_thread
    }

    #[must_use]
    pub const fn get_duration(&self) -> Option<Duration> {
        self.time_limit
    }

    #[must_use]
    pub const fn get_capacity(&self) -> usize {
        self.pool.get_capacity()
    }

    /// Calls a run makes when no time limit cuts it short.
    #[must_use]
    pub const fn total_operations(&self) -> usize {
        self.threads.saturating_mul(self.calls_per_thread)
    }

    #[must_use]
    pub const fn pool_config(&self) -> PoolConfig {
        self.pool
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self::new()
    }
}
