//! Ticket pool scenarios shared by tests, benches and the CLI.
//!
//! Each scenario runs against any `Arc<dyn TicketPool>`:
//! - Purchase contention: many buyers racing over a full pool
//! - Producer-consumer: adders and buyers sharing one pool
//! - Mixed roles: every worker role running under a supervisor

pub mod compare;
pub mod contention;
pub mod mixed;
pub mod producer_consumer;

pub use compare::{compare_strategies, Scenario};
pub use contention::run_purchase_contention;
pub use mixed::{run_mixed_roles, MixedRolesOutcome};
pub use producer_consumer::run_producer_consumer;
