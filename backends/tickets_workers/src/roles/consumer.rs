use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tickets_core::{PoolError, Ticket, TicketPool};

use crate::{Ledger, Role, StopSignal, Worker, WorkerConfig, WorkerReport};

/// How a consumer treats the tickets it bought.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerConfig {
    /// Chance in `[0, 1]` that a bought ticket is handed back.
    pub cancel_probability: f64,
    /// How long a ticket is held before it is handed back.
    pub hold: Range<Duration>,
}

impl ConsumerConfig {
    pub const DEFAULT_CANCEL_PROBABILITY: f64 = 0.1;
    pub const DEFAULT_HOLD: Range<Duration> = Duration::from_millis(200)..Duration::from_millis(700);

    #[must_use]
    pub fn new(cancel_probability: f64, hold: Range<Duration>) -> Self {
        Self {
            cancel_probability,
            hold,
        }
    }

    /// A consumer that keeps everything it buys.
    #[must_use]
    pub fn keep_all() -> Self {
        Self::new(0.0, Duration::ZERO..Duration::ZERO)
    }

    fn should_cancel(&self) -> bool {
        if self.cancel_probability.is_nan() {
            return false;
        }
        rand::rng().random_bool(self.cancel_probability.clamp(0.0, 1.0))
    }

    fn hold_for(&self) -> Duration {
        if self.hold.is_empty() {
            return self.hold.start;
        }
        rand::rng().random_range(self.hold.clone())
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CANCEL_PROBABILITY, Self::DEFAULT_HOLD)
    }
}

/// `Consumer` buys tickets until it owns [`WorkerConfig::attempts`] of
/// them.
///
/// Only successful purchases count toward the limit, so a consumer facing an
/// empty pool keeps trying until it is stopped or the pool closes.
#[derive(Debug)]
pub struct Consumer {
    name: String,
    pool: Arc<dyn TicketPool>,
    ledger: Arc<Ledger>,
    config: WorkerConfig,
    payload: ConsumerConfig,
}

impl Consumer {
    pub fn new(
        name: impl Into<String>,
        pool: Arc<dyn TicketPool>,
        ledger: Arc<Ledger>,
        config: WorkerConfig,
        payload: ConsumerConfig,
    ) -> Self {
        Self {
            name: name.into(),
            pool,
            ledger,
            config,
            payload,
        }
    }

    /// Holds `ticket` for a while, then hands it back.
    fn hold_and_cancel(&self, ticket: &Ticket, stop: &StopSignal, report: &mut WorkerReport) {
        let held = self.payload.hold_for();
        // a stop during the hold still hands the ticket back
        stop.sleep(held);

        match self.pool.cancel(ticket) {
            Ok(()) => {
                self.ledger.record_cancelled(&self.name);
                tracing::debug!("{} cancelled ticket {} after {held:?}", self.name, ticket.id());
            }
            Err(err) => {
                report.failures += 1;
                tracing::warn!("{} could not cancel ticket {}: {err}", self.name, ticket.id());
            }
        }
    }
}

impl Worker for Consumer {
    fn role(&self) -> Role {
        Role::Consumer
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(self, stop: &StopSignal) -> WorkerReport {
        let mut report = WorkerReport::new(&self.name, Role::Consumer);

        tracing::info!("{} started purchasing", self.name);
        while report.successes < self.config.attempts && !stop.is_stopped() {
            report.attempts += 1;

            match self.pool.purchase() {
                Ok(ticket) => {
                    report.successes += 1;
                    self.ledger.record_purchased(&self.name);
                    tracing::debug!("{} purchased ticket {}", self.name, ticket.id());

                    if self.payload.should_cancel() {
                        self.hold_and_cancel(&ticket, stop, &mut report);
                    }
                }
                Err(PoolError::Timeout) => {
                    report.timeouts += 1;
                    tracing::debug!("{} found no ticket in time", self.name);
                }
                Err(PoolError::Closed) => {
                    tracing::info!("{} saw the pool close", self.name);
                    break;
                }
                Err(err) => {
                    report.failures += 1;
                    tracing::warn!("{} failed to purchase: {err}", self.name);
                }
            }

            if !stop.sleep(self.config.interval) {
                break;
            }
        }

        tracing::info!("{} finished: {}", self.name, report);
        report
    }
}

#[cfg(test)]
mod test_consumer_config {
    use std::time::Duration;

    use super::ConsumerConfig;

    #[test]
    fn keep_all_never_cancels() {
        let config = ConsumerConfig::keep_all();
        assert!((0..100).all(|_| !config.should_cancel()));
        assert_eq!(config.hold_for(), Duration::ZERO);
    }

    #[test]
    fn out_of_range_probability_is_clamped() {
        let always = ConsumerConfig::new(4.0, Duration::ZERO..Duration::ZERO);
        assert!((0..100).all(|_| always.should_cancel()));

        let never = ConsumerConfig::new(-1.0, Duration::ZERO..Duration::ZERO);
        assert!((0..100).all(|_| !never.should_cancel()));
    }

    #[test]
    fn hold_stays_inside_the_range() {
        let config = ConsumerConfig::default();
        for _ in 0..100 {
            let held = config.hold_for();
            assert!(held >= Duration::from_millis(200));
            assert!(held < Duration::from_millis(700));
        }
    }
}
