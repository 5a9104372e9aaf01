//! Role drivers for ticket pool simulations.
//!
//! This crate provides:
//! - **Roles**: [`Producer`], [`Consumer`], [`Writer`] and [`Reader`], each a paced, bounded loop
//! - **[`StopSignal`]**: stops a role between iterations and cuts its pauses short
//! - **[`Ledger`]**: per-run tallies of produced, purchased and cancelled tickets
//! - **[`Supervisor`]**: runs roles on named threads and collects their [`WorkerReport`]s
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tickets_core::{PoolConfig, Strategy};
//! use tickets_workers::{
//!     Consumer, ConsumerConfig, Ledger, Producer, ProducerConfig, Supervisor, WorkerConfig,
//! };
//!
//! let pool = Strategy::Monitor
//!     .build_with(PoolConfig::new(10).wait_timeout(Duration::from_millis(200)))
//!     .expect("capacity is positive");
//! let ledger = Arc::new(Ledger::new());
//! let pacing = WorkerConfig::new(Duration::from_millis(1), 5);
//!
//! let mut supervisor = Supervisor::new();
//! supervisor
//!     .spawn(Producer::new(
//!         "producer",
//!         Arc::clone(&pool),
//!         Arc::clone(&ledger),
//!         pacing,
//!         ProducerConfig::new("Concert", "Vendor-A", "Lisbon", 40.0),
//!     ))
//!     .expect("should spawn");
//! supervisor
//!     .spawn(Consumer::new(
//!         "consumer",
//!         Arc::clone(&pool),
//!         Arc::clone(&ledger),
//!         pacing,
//!         ConsumerConfig::keep_all(),
//!     ))
//!     .expect("should spawn");
//!
//! let reports = supervisor.join_all();
//! assert_eq!(reports.len(), 2);
//! assert_eq!(ledger.snapshot().total_purchased(), 5);
//! ```

mod errors;
mod ledger;
mod roles;
mod signal;
mod supervisor;

pub use errors::*;
pub use ledger::{Ledger, LedgerSnapshot};
pub use roles::*;
pub use signal::StopSignal;
pub use supervisor::{Supervisor, WorkerId};
