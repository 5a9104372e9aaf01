//! Side-by-side runs of every strategy.

use derive_more::derive::Display;
use tickets_core::{PoolResult, Strategy};

use crate::metrics::{PerformanceReport, Reporter};
use crate::scenarios::{run_producer_consumer, run_purchase_contention};
use crate::stress::StressConfig;

/// Stress scenario to compare strategies under.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scenario {
    #[default]
    #[display("purchase contention")]
    PurchaseContention,
    #[display("producer-consumer")]
    ProducerConsumer,
}

/// Runs `scenario` against a fresh pool of every [`Strategy`] and returns
/// one report per strategy, in [`Strategy::ALL`] order.
///
/// Producer-consumer pools are grown to fit every add, so the numbers show
/// contention between threads rather than a full pool.
///
/// # Errors
///
/// [`tickets_core::PoolError::InvalidCapacity`] when the config asks for a
/// zero capacity.
pub fn compare_strategies(
    config: StressConfig,
    scenario: Scenario,
) -> PoolResult<Vec<PerformanceReport>> {
    let config = match scenario {
        Scenario::PurchaseContention => config,
        Scenario::ProducerConsumer => {
            config.capacity(config.get_capacity().max(config.total_operations()))
        }
    };

    let mut reports = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        tracing::info!("Running {scenario} against the {strategy} strategy");

        let pool = strategy.build_with(config.pool_config())?;
        let result = match scenario {
            Scenario::PurchaseContention => run_purchase_contention(&pool, config),
            Scenario::ProducerConsumer => run_producer_consumer(&pool, config),
        };
        reports.push(Reporter::generate(
            scenario.to_string(),
            strategy,
            result.to_metrics(),
        ));
    }

    Ok(reports)
}

#[cfg(test)]
mod test_compare {
    use tracing_test::traced_test;

    use super::{compare_strategies, Scenario};
    use crate::stress::StressConfig;

    #[test]
    #[traced_test]
    fn every_strategy_run_is_logged() {
        let config = StressConfig::new().threads(2).iterations(10).capacity(4);
        let reports =
            compare_strategies(config, Scenario::ProducerConsumer).expect("should compare");

        assert_eq!(reports.len(), 3);
        assert!(logs_contain("Running producer-consumer against the monitor strategy"));
        assert!(logs_contain("Running producer-consumer against the queued strategy"));
    }

    #[test]
    fn purchase_contention_is_the_default() {
        assert_eq!(Scenario::default(), Scenario::PurchaseContention);
        assert_eq!(Scenario::ProducerConsumer.to_string(), "producer-consumer");
    }
}
