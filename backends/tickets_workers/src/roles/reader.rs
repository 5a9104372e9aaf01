use std::sync::Arc;

use tickets_core::TicketPool;

use crate::{Ledger, Role, StopSignal, Worker, WorkerConfig, WorkerReport};

/// `Reader` logs the pool status once per interval.
#[derive(Debug)]
pub struct Reader {
    name: String,
    pool: Arc<dyn TicketPool>,
    ledger: Arc<Ledger>,
    config: WorkerConfig,
}

impl Reader {
    pub fn new(
        name: impl Into<String>,
        pool: Arc<dyn TicketPool>,
        ledger: Arc<Ledger>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            name: name.into(),
            pool,
            ledger,
            config,
        }
    }
}

impl Worker for Reader {
    fn role(&self) -> Role {
        Role::Reader
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(self, stop: &StopSignal) -> WorkerReport {
        let mut report = WorkerReport::new(&self.name, Role::Reader);

        while report.attempts < self.config.attempts && !stop.is_stopped() {
            report.attempts += 1;

            let status = self.pool.status();
            tracing::info!("{}: {status}", self.name);
            report.successes += 1;
            self.ledger.record_read();

            if status.closed || !stop.sleep(self.config.interval) {
                break;
            }
        }

        report
    }
}
