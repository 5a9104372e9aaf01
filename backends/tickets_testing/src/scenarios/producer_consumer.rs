//! Adders and buyers sharing one pool.

use std::sync::Arc;

use tickets_core::TicketPool;

use crate::stress::{StressConfig, StressHarness, StressResult};

/// Splits the configured threads into producers (even indexes) and
/// consumers (odd indexes).
///
/// Producers add one fresh ticket per iteration and consumers buy one.
/// Sold tickets keep their slot, so producers start timing out once
/// `capacity` tickets were added; size the pool to
/// `threads * iterations / 2` or more for a run without timeouts.
pub fn run_producer_consumer(pool: &Arc<dyn TicketPool>, config: StressConfig) -> StressResult {
    let result = StressHarness::new(config).run(|thread_id, iteration| {
        if thread_id % 2 == 0 {
            let ticket = pool.create_ticket(
                &format!("Event-{iteration}"),
                &format!("Vendor-{thread_id}"),
                "Stadium",
                50.0,
            );
            pool.add(ticket)
        } else {
            pool.purchase().map(|_| ())
        }
    });

    tracing::debug!(
        "{} producer-consumer: {} ok, {} timeouts, {} failed",
        pool.strategy(),
        result.successes,
        result.timeouts,
        result.failures
    );
    result
}
