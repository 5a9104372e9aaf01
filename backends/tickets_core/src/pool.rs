use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::{
    LockedTicketPool, MonitorTicketPool, PoolError, PoolResult, QueuedTicketPool, Ticket, TicketId,
};

/// [`DEFAULT_WAIT_TIMEOUT`] is the bounded wait applied to `add`, `purchase`
/// and `random_available` when none is configured.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// `TicketPool` is the contract shared by every locking strategy.
///
/// Blocking operations (`add`, `purchase`, `random_available`) wait at most
/// [`TicketPool::wait_timeout`] and report [`PoolError::Timeout`] instead of
/// waiting forever. Everything else only holds a short critical section.
///
/// Sold tickets stay members of the pool and keep occupying their slot, so
/// `available_count() + sold_count() == size() <= capacity()` holds for every
/// snapshot taken with [`TicketPool::status`].
pub trait TicketPool: Send + Sync + core::fmt::Debug {
    fn strategy(&self) -> Strategy;

    fn capacity(&self) -> usize;

    fn wait_timeout(&self) -> Duration;

    /// Allocates a fresh identity and returns a ticket that is not yet a
    /// member of the pool. Never blocks.
    fn create_ticket(&self, event_name: &str, vendor_name: &str, location: &str, price: f64)
        -> Ticket;

    /// Links `ticket` into the pool, waiting for a free slot.
    ///
    /// # Errors
    ///
    /// [`PoolError::Timeout`] when the pool stayed full, [`PoolError::Closed`]
    /// after [`TicketPool::close`], [`PoolError::Duplicate`] when the identity
    /// is already a member and [`PoolError::NotAMember`] when another pool
    /// created `ticket`. Both rejections are reported without waiting.
    fn add(&self, ticket: Ticket) -> PoolResult<()>;

    /// Marks the first available ticket as sold and returns a snapshot of it.
    ///
    /// # Errors
    ///
    /// [`PoolError::Timeout`] when no unsold ticket showed up in time,
    /// [`PoolError::Closed`] after [`TicketPool::close`].
    fn purchase(&self) -> PoolResult<Ticket>;

    /// Returns a sold member to the purchasable set.
    ///
    /// # Errors
    ///
    /// [`PoolError::NotAMember`] for tickets this pool does not hold and
    /// [`PoolError::NotSold`] for members that are still available. Neither
    /// changes the pool.
    fn cancel(&self, ticket: &Ticket) -> PoolResult<()>;

    /// Replaces price, location and event name of a member in one step.
    ///
    /// # Errors
    ///
    /// [`PoolError::NotFound`] when no member carries `id`.
    fn update(&self, id: TicketId, price: f64, location: &str, event_name: &str)
        -> PoolResult<()>;

    /// Returns a uniformly random unsold ticket without selling it.
    ///
    /// # Errors
    ///
    /// Same as [`TicketPool::purchase`].
    fn random_available(&self) -> PoolResult<Ticket>;

    fn get(&self, id: TicketId) -> Option<Ticket>;

    fn size(&self) -> usize;

    fn available_count(&self) -> usize;

    fn sold_count(&self) -> usize;

    /// Takes all counters inside one critical section.
    fn status(&self) -> PoolStatus;

    fn all_tickets(&self) -> Vec<Ticket>;

    fn available_tickets(&self) -> Vec<Ticket>;

    /// Wakes every waiter; blocking operations fail with
    /// [`PoolError::Closed`] from here on.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Construction parameters shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    capacity: usize,
    wait_timeout: Duration,
}

impl PoolConfig {
    /// Creates a configuration with [`DEFAULT_WAIT_TIMEOUT`].
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }

    /// Sets the bounded wait of the blocking operations.
    #[must_use]
    pub const fn wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    #[must_use]
    pub const fn get_capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn get_wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// # Errors
    ///
    /// [`PoolError::InvalidCapacity`] for a zero capacity.
    pub fn validate(&self) -> PoolResult<()> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidCapacity);
        }
        Ok(())
    }
}

/// `Strategy` selects the locking discipline behind a [`TicketPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One mutex, one condvar, notify-all on every mutation.
    Monitor,
    /// One mutex with `not_full` / `not_empty` condvars.
    Locked,
    /// Bounded concurrent queue plus a read/write lock.
    Queued,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Monitor, Strategy::Locked, Strategy::Queued];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Strategy::Monitor => "monitor",
            Strategy::Locked => "locked",
            Strategy::Queued => "queued",
        }
    }

    /// # Errors
    ///
    /// [`PoolError::InvalidCapacity`] for a zero capacity.
    pub fn build(self, capacity: usize) -> PoolResult<Arc<dyn TicketPool>> {
        self.build_with(PoolConfig::new(capacity))
    }

    /// # Errors
    ///
    /// [`PoolError::InvalidCapacity`] for a zero capacity.
    pub fn build_with(self, config: PoolConfig) -> PoolResult<Arc<dyn TicketPool>> {
        let pool: Arc<dyn TicketPool> = match self {
            Strategy::Monitor => Arc::new(MonitorTicketPool::with_config(config)?),
            Strategy::Locked => Arc::new(LockedTicketPool::with_config(config)?),
            Strategy::Queued => Arc::new(QueuedTicketPool::with_config(config)?),
        };
        tracing::debug!(
            "Built {} ticket pool with capacity {} and wait timeout {:?}",
            self,
            config.get_capacity(),
            config.get_wait_timeout()
        );
        Ok(pool)
    }
}

impl core::fmt::Display for Strategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Strategy {
    type Err = PoolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monitor" | "synchronized" | "1" => Ok(Strategy::Monitor),
            "locked" | "lock" | "reentrant" | "2" => Ok(Strategy::Locked),
            "queued" | "queue" | "blocking-queue" | "3" => Ok(Strategy::Queued),
            _ => Err(PoolError::UnknownStrategy(value.to_owned())),
        }
    }
}

/// Point-in-time view of a pool's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub strategy: Strategy,
    pub capacity: usize,
    pub size: usize,
    pub available: usize,
    pub sold: usize,
    pub closed: bool,
}

const STATUS_BAR_WIDTH: usize = 30;

impl PoolStatus {
    /// Percentage of held tickets that are sold, `0.0` for an empty pool.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage_sold(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.sold as f64 / self.size as f64 * 100.0
        }
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.size >= self.capacity
    }

    /// Renders `#` for sold, `=` for available and `.` for free slots.
    #[must_use]
    pub fn capacity_bar(&self) -> String {
        let scale = |count: usize| (count * STATUS_BAR_WIDTH) / self.capacity.max(1);
        let sold_blocks = scale(self.sold);
        let filled_blocks = scale(self.size).max(sold_blocks);

        let mut bar = String::with_capacity(STATUS_BAR_WIDTH + 2);
        bar.push('[');
        for index in 0..STATUS_BAR_WIDTH {
            bar.push(if index < sold_blocks {
                '#'
            } else if index < filled_blocks {
                '='
            } else {
                '.'
            });
        }
        bar.push(']');
        bar
    }
}

impl core::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[{}] {} {}/{} | available: {} | sold: {} ({:.2}%)",
            self.strategy,
            self.capacity_bar(),
            self.size,
            self.capacity,
            self.available,
            self.sold,
            self.percentage_sold()
        )?;
        if self.closed {
            write!(f, " | closed")?;
        }
        Ok(())
    }
}

/// `Deadline` is an absolute point in time computed once on entry to a
/// blocking call, so every wake-up recomputes what is left of the budget.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    at: Instant,
}

impl Deadline {
    pub(crate) fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    /// Remaining budget, `None` once the deadline has passed.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        let remaining = self.at.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            None
        } else {
            Some(remaining)
        }
    }
}

#[cfg(test)]
mod test_pool_types {
    use std::time::Duration;

    use super::{Deadline, PoolConfig, PoolStatus, Strategy};
    use crate::PoolError;

    #[test]
    fn strategy_parses_aliases() {
        assert_eq!("monitor".parse::<Strategy>(), Ok(Strategy::Monitor));
        assert_eq!("Reentrant".parse::<Strategy>(), Ok(Strategy::Locked));
        assert_eq!(" blocking-queue ".parse::<Strategy>(), Ok(Strategy::Queued));
        assert_eq!(
            "spinlock".parse::<Strategy>(),
            Err(PoolError::UnknownStrategy("spinlock".into()))
        );
    }

    #[test]
    fn zero_capacity_is_rejected_by_every_strategy() {
        for strategy in Strategy::ALL {
            assert_eq!(
                strategy.build(0).map(|_| ()),
                Err(PoolError::InvalidCapacity),
                "{strategy} accepted a zero capacity"
            );
        }
    }

    #[test]
    fn config_builder_keeps_values() {
        let config = PoolConfig::new(12).wait_timeout(Duration::from_millis(40));
        assert_eq!(config.get_capacity(), 12);
        assert_eq!(config.get_wait_timeout(), Duration::from_millis(40));
    }

    #[test]
    fn status_renders_bar_and_percentage() {
        let status = PoolStatus {
            strategy: Strategy::Locked,
            capacity: 10,
            size: 4,
            available: 2,
            sold: 2,
            closed: false,
        };

        assert!((status.percentage_sold() - 50.0).abs() < f64::EPSILON);
        assert_eq!(status.capacity_bar(), format!("[{}{}{}]", "#".repeat(6), "=".repeat(6), ".".repeat(18)));
        assert_eq!(
            status.to_string(),
            format!("[locked] {} 4/10 | available: 2 | sold: 2 (50.00%)", status.capacity_bar())
        );
    }

    #[test]
    fn expired_deadline_has_no_budget_left() {
        let deadline = Deadline::after(Duration::ZERO);
        assert!(deadline.remaining().is_none());

        let deadline = Deadline::after(Duration::from_secs(60));
        assert!(deadline.remaining().is_some());
    }
}
