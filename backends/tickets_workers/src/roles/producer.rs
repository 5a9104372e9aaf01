use std::sync::Arc;
use std::time::Duration;

use tickets_core::{PoolError, TicketPool};

use crate::{Ledger, Role, StopSignal, Worker, WorkerConfig, WorkerReport};

/// What a producer mints, plus how it reacts to a full pool.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerConfig {
    pub event_name: String,
    pub vendor_name: String,
    pub location: String,
    pub price: f64,
    /// Consecutive timed-out adds after which the producer gives up.
    pub max_retries: usize,
    /// Extra pause after a timed-out add that did not exhaust the retries.
    pub retry_backoff: Duration,
}

impl ProducerConfig {
    pub const DEFAULT_MAX_RETRIES: usize = 3;
    pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

    #[must_use]
    pub fn new(
        event_name: impl Into<String>,
        vendor_name: impl Into<String>,
        location: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            vendor_name: vendor_name.into(),
            location: location.into(),
            price,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            retry_backoff: Self::DEFAULT_RETRY_BACKOFF,
        }
    }

    #[must_use]
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// `Producer` creates tickets and adds them to the pool.
///
/// Every iteration counts toward [`WorkerConfig::attempts`], successful or
/// not. Successful adds are recorded in the [`Ledger`] under the vendor name.
#[derive(Debug)]
pub struct Producer {
    name: String,
    pool: Arc<dyn TicketPool>,
    ledger: Arc<Ledger>,
    config: WorkerConfig,
    payload: ProducerConfig,
}

impl Producer {
    pub fn new(
        name: impl Into<String>,
        pool: Arc<dyn TicketPool>,
        ledger: Arc<Ledger>,
        config: WorkerConfig,
        payload: ProducerConfig,
    ) -> Self {
        Self {
            name: name.into(),
            pool,
            ledger,
            config,
            payload,
        }
    }
}

impl Worker for Producer {
    fn role(&self) -> Role {
        Role::Producer
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(self, stop: &StopSignal) -> WorkerReport {
        let mut report = WorkerReport::new(&self.name, Role::Producer);
        let mut consecutive_timeouts = 0;

        tracing::info!("{} started producing for {}", self.name, self.payload.vendor_name);
        while report.attempts < self.config.attempts && !stop.is_stopped() {
            report.attempts += 1;

            let ticket = self.pool.create_ticket(
                &self.payload.event_name,
                &self.payload.vendor_name,
                &self.payload.location,
                self.payload.price,
            );
            let id = ticket.id();

            match self.pool.add(ticket) {
                Ok(()) => {
                    consecutive_timeouts = 0;
                    report.successes += 1;
                    self.ledger.record_produced(&self.payload.vendor_name);
                    tracing::debug!("{} added ticket {id}", self.name);
                }
                Err(PoolError::Timeout) => {
                    consecutive_timeouts += 1;
                    report.timeouts += 1;
                    if consecutive_timeouts >= self.payload.max_retries {
                        tracing::info!(
                            "{} gave up after {consecutive_timeouts} timed-out adds",
                            self.name
                        );
                        break;
                    }
                    if !stop.sleep(self.payload.retry_backoff) {
                        break;
                    }
                }
                Err(PoolError::Closed) => {
                    tracing::info!("{} saw the pool close", self.name);
                    break;
                }
                Err(err) => {
                    report.failures += 1;
                    tracing::warn!("{} failed to add ticket {id}: {err}", self.name);
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
