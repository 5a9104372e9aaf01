//! Every worker role running against one pool at once.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tickets_core::{PoolStatus, TicketPool};
use tickets_workers::{
    Consumer, ConsumerConfig, Ledger, LedgerSnapshot, Producer, ProducerConfig, Reader,
    Supervisor, WorkerConfig, WorkerReport, WorkerResult, Writer,
};

use crate::stress::StressConfig;

/// How long a mixed run may take when the config sets no duration.
const DEFAULT_RUN_LIMIT: Duration = Duration::from_secs(5);

/// What a mixed-role run left behind.
#[derive(Debug, Clone)]
pub struct MixedRolesOutcome {
    pub reports: Vec<WorkerReport>,
    pub ledger: LedgerSnapshot,
    /// Pool status taken after every worker was joined.
    pub status: PoolStatus,
    pub duration: Duration,
}

/// Spawns `threads` workers, assigned round-robin to producer, consumer,
/// writer and reader, each with `iterations` attempts and no pacing.
///
/// The run ends when every worker is done or the configured duration has
/// passed. Whatever is still running is then stopped, and the pool is
/// closed so blocked workers return.
///
/// # Errors
///
/// Propagates [`tickets_workers::WorkerError::Spawn`] when a thread cannot
/// be created. Workers spawned before the failure are stopped on return.
pub fn run_mixed_roles(
    pool: &Arc<dyn TicketPool>,
    config: StressConfig,
) -> WorkerResult<MixedRolesOutcome> {
    let started = Instant::now();
    let limit = config.get_duration().unwrap_or(DEFAULT_RUN_LIMIT);
    let pacing = WorkerConfig::new(Duration::ZERO, config.get_iterations());
    let ledger = Arc::new(Ledger::new());
    let mut supervisor = Supervisor::new();

    for n in 0..config.get_thread_count() {
        let name = format!("mixed-{n}");
        let pool = Arc::clone(pool);
        let ledger = Arc::clone(&ledger);
        match n % 4 {
            0 => supervisor.spawn(Producer::new(
                name,
                pool,
                ledger,
                pacing,
                ProducerConfig::new("Festival", format!("Vendor-{n}"), "Field", 65.0)
                    .retry_backoff(Duration::from_millis(1)),
            ))?,
            1 => supervisor.spawn(Consumer::new(
                name,
                pool,
                ledger,
                pacing,
                ConsumerConfig::new(0.3, Duration::ZERO..Duration::from_millis(2)),
            ))?,
            2 => supervisor.spawn(Writer::new(name, pool, ledger, pacing, None))?,
            _ => supervisor.spawn(Reader::new(name, pool, ledger, pacing))?,
        };
    }

    while supervisor.running() > 0 && started.elapsed() < limit {
        thread::sleep(Duration::from_millis(5));
    }

    if supervisor.running() > 0 {
        tracing::debug!("Mixed run hit its {limit:?} limit, stopping the rest");
    }
    supervisor.stop_all();
    pool.close();
    let reports = supervisor.join_all();

    Ok(MixedRolesOutcome {
        reports,
        ledger: ledger.snapshot(),
        status: pool.status(),
        duration: started.elapsed(),
    })
}
