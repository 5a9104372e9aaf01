//! Bounded, thread-safe ticket pools.
//!
//! This crate provides:
//! - **[`Ticket`]**: pool-assigned identity, mutable descriptive fields and a sold flag
//! - **[`TicketPool`]**: the blocking-with-timeout contract shared by all strategies
//! - **Three strategies**: [`MonitorTicketPool`], [`LockedTicketPool`] and [`QueuedTicketPool`]
//! - **[`Strategy`]**: selects and builds a strategy at runtime
//!
//! # Examples
//!
//! ```rust
//! use tickets_core::{PoolConfig, Strategy};
//! use std::time::Duration;
//!
//! let pool = Strategy::Locked
//!     .build_with(PoolConfig::new(2).wait_timeout(Duration::from_millis(20)))
//!     .expect("capacity is positive");
//!
//! let ticket = pool.create_ticket("Concert", "Vendor-A", "London", 80.0);
//! pool.add(ticket).expect("pool has room");
//!
//! let bought = pool.purchase().expect("one ticket is available");
//! assert!(bought.is_sold());
//! assert!(pool.purchase().unwrap_err().is_timeout());
//!
//! pool.cancel(&bought).expect("ticket was sold by this pool");
//! assert_eq!(pool.available_count(), 1);
//! ```

mod errors;
mod locked;
mod monitor;
mod pool;
mod queued;
mod ticket;

pub use errors::*;
pub use locked::LockedTicketPool;
pub use monitor::MonitorTicketPool;
pub use pool::{PoolConfig, PoolStatus, Strategy, TicketPool, DEFAULT_WAIT_TIMEOUT};
pub use queued::QueuedTicketPool;
pub use ticket::{Ticket, TicketId, TicketIdGenerator};
