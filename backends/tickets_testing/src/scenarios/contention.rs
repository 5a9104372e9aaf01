//! Buyers racing over a pool that is kept full.

use std::sync::Arc;

use tickets_core::TicketPool;

use crate::stress::{StressConfig, StressHarness, StressResult};

/// Fills `pool` up to its capacity, then has every thread buy a ticket and
/// hand it straight back on each iteration.
///
/// An iteration succeeds only when both the purchase and the cancel do, so
/// a correct pool ends the run with nothing sold.
pub fn run_purchase_contention(pool: &Arc<dyn TicketPool>, config: StressConfig) -> StressResult {
    let missing = pool.capacity().saturating_sub(pool.size());
    for n in 0..missing {
        let ticket = pool.create_ticket(&format!("Event-{n}"), "Vendor-Stress", "Arena", 75.0);
        if let Err(err) = pool.add(ticket) {
            tracing::warn!("Stopped filling the {} pool early: {err}", pool.strategy());
            break;
        }
    }

    let result = StressHarness::new(config).run(|_thread_id, _iteration| {
        let ticket = pool.purchase()?;
        pool.cancel(&ticket)
    });

    tracing::debug!(
        "{} purchase contention: {} ok, {} timeouts, {} failed",
        pool.strategy(),
        result.successes,
        result.timeouts,
        result.failures
    );
    result
}
