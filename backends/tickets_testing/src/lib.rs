//! Reusable stress infrastructure for ticket pools.
//!
//! This crate provides:
//! - **Stress framework**: configurable high-contention runs over pool operations
//! - **Scenarios**: purchase contention, producer-consumer and mixed roles
//! - **Performance metrics**: latency percentiles, throughput and strategy comparisons
//! - **Criterion benchmarks**: add, purchase and cancel across every strategy
//!
//! # Examples
//!
//! ```rust
//! use tickets_core::Strategy;
//! use tickets_testing::scenarios::run_purchase_contention;
//! use tickets_testing::stress::StressConfig;
//!
//! let config = StressConfig::new().threads(4).iterations(50).capacity(8);
//! let pool = Strategy::Queued.build_with(config.pool_config()).expect("should build");
//!
//! let result = run_purchase_contention(&pool, config);
//!
//! assert_eq!(result.failures, 0);
//! assert_eq!(pool.sold_count(), 0);
//! assert!(result.success_rate() > 0.9);
//! ```

pub mod metrics;
pub mod scenarios;
pub mod stress;

pub use metrics::{LatencySummary, Metrics, PerformanceReport, Reporter};
pub use scenarios::{compare_strategies, Scenario};
pub use stress::{StressConfig, StressHarness, StressResult};
