use std::sync::Arc;

use rand::Rng;
use tickets_core::{PoolError, TicketPool};

use crate::{Ledger, Role, StopSignal, Worker, WorkerConfig, WorkerReport};

/// The triple a writer stamps onto a ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct WriterUpdate {
    pub price: f64,
    pub location: String,
    pub event_name: String,
}

impl WriterUpdate {
    #[must_use]
    pub fn new(price: f64, location: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            price,
            location: location.into(),
            event_name: event_name.into(),
        }
    }

    /// Price in `[50, 300)`, `Location-{1..9}` and `Event-{1..4}`.
    #[must_use]
    pub fn random() -> Self {
        let mut rng = rand::rng();
        Self::new(
            rng.random_range(50.0..300.0),
            format!("Location-{}", rng.random_range(1..10)),
            format!("Event-{}", rng.random_range(1..5)),
        )
    }
}

/// `Writer` picks a random unsold ticket and rewrites its details.
///
/// Without a fixed [`WriterUpdate`] every update draws a fresh random one.
/// Only applied updates count toward [`WorkerConfig::attempts`].
#[derive(Debug)]
pub struct Writer {
    name: String,
    pool: Arc<dyn TicketPool>,
    ledger: Arc<Ledger>,
    config: WorkerConfig,
    update: Option<WriterUpdate>,
}

impl Writer {
    pub fn new(
        name: impl Into<String>,
        pool: Arc<dyn TicketPool>,
        ledger: Arc<Ledger>,
        config: WorkerConfig,
        update: Option<WriterUpdate>,
    ) -> Self {
        Self {
            name: name.into(),
            pool,
            ledger,
            config,
            update,
        }
    }
}

impl Worker for Writer {
    fn role(&self) -> Role {
        Role::Writer
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(self, stop: &StopSignal) -> WorkerReport {
        let mut report = WorkerReport::new(&self.name, Role::Writer);

        tracing::info!("{} started updating", self.name);
        while report.successes < self.config.attempts && !stop.is_stopped() {
            report.attempts += 1;

            let target = match self.pool.random_available() {
                Ok(ticket) => ticket,
                Err(PoolError::Timeout) => {
                    report.timeouts += 1;
                    tracing::debug!("{} found nothing to update", self.name);
                    continue;
                }
                Err(PoolError::Closed) => {
                    tracing::info!("{} saw the pool close", self.name);
                    break;
                }
                Err(err) => {
                    report.failures += 1;
                    tracing::warn!("{} failed to pick a ticket: {err}", self.name);
                    continue;
                }
            };

            let update = self.update.clone().unwrap_or_else(WriterUpdate::random);
            match self
                .pool
                .update(target.id(), update.price, &update.location, &update.event_name)
            {
                Ok(()) => {
                    report.successes += 1;
                    self.ledger.record_updated();
                    tracing::debug!(
                        "{} updated ticket {} to {:.2} at {} for {}",
                        self.name,
                        target.id(),
                        update.price,
                        update.location,
                        update.event_name
                    );
                }
                Err(err) => {
                    report.failures += 1;
                    tracing::warn!("{} failed to update ticket {}: {err}", self.name, target.id());
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
