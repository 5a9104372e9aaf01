//! Paced roles that drive a [`tickets_core::TicketPool`].
//!
//! Every role runs the same bounded loop: check the [`StopSignal`], attempt
//! one pool operation, record the outcome, then sleep the configured
//! interval. A role returns its [`WorkerReport`] when it hits its attempt
//! limit, when its signal is stopped or when the pool reports
//! [`tickets_core::PoolError::Closed`].

use std::fmt;
use std::time::Duration;

use derive_more::derive::Display;

use crate::StopSignal;

mod consumer;
mod producer;
mod reader;
mod writer;

pub use consumer::{Consumer, ConsumerConfig};
pub use producer::{Producer, ProducerConfig};
pub use reader::Reader;
pub use writer::{Writer, WriterUpdate};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    #[display("producer")]
    Producer,
    #[display("consumer")]
    Consumer,
    #[display("writer")]
    Writer,
    #[display("reader")]
    Reader,
}

/// Pacing shared by every role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Pause after each attempt.
    pub interval: Duration,
    /// Upper bound on loop iterations, see each role for what counts.
    pub attempts: usize,
}

impl WorkerConfig {
    #[must_use]
    pub const fn new(interval: Duration, attempts: usize) -> Self {
        Self { interval, attempts }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 10)
    }
}

/// `WorkerReport` is what a role hands back when its loop ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub name: String,
    pub role: Role,
    pub attempts: usize,
    pub successes: usize,
    pub timeouts: usize,
    pub failures: usize,
}

impl WorkerReport {
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            attempts: 0,
            successes: 0,
            timeouts: 0,
            failures: 0,
        }
    }
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<9} {:<20} attempts: {:<5} successes: {:<5} timeouts: {:<5} failures: {}",
            self.role.to_string(),
            self.name,
            self.attempts,
            self.successes,
            self.timeouts,
            self.failures
        )
    }
}

/// `Worker` is a role that can be moved onto its own thread.
pub trait Worker: Send + 'static {
    fn role(&self) -> Role;

    fn name(&self) -> &str;

    /// Runs the role loop to completion on the calling thread.
    fn run(self, stop: &StopSignal) -> WorkerReport
    where
        Self: Sized;
}
