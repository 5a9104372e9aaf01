//! TOML description of a simulation run.
//!
//! ```toml
//! capacity = 50
//! strategy = "queued"
//! wait_timeout_ms = 5000
//! duration_secs = 20
//!
//! [[producers]]
//! vendor_name = "Vendor-A"
//! event_name = "Concert"
//! location = "London"
//! price = 120.0
//! interval_ms = 1000
//! attempts = 30
//! count = 2
//!
//! [[consumers]]
//! cancel_probability = 0.1
//! interval_ms = 1500
//! attempts = 10
//! count = 3
//!
//! [[writers]]
//! interval_ms = 2000
//! attempts = 5
//!
//! [[readers]]
//! interval_ms = 1000
//! attempts = 20
//! ```
//!
//! Every key is optional. Missing keys take the values of the matching
//! `Default` impl, and a missing role table means no workers of that role.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tickets_core::{PoolConfig, Strategy, DEFAULT_WAIT_TIMEOUT};
use tickets_workers::{ConsumerConfig, ProducerConfig, WorkerConfig, WriterUpdate};

use crate::{from_path, from_toml, ConfigError, ConfigResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub capacity: usize,
    pub strategy: Strategy,
    pub wait_timeout_ms: u64,
    pub duration_secs: u64,
    pub producers: Vec<ProducerEntry>,
    pub consumers: Vec<ConsumerEntry>,
    pub writers: Vec<WriterEntry>,
    pub readers: Vec<ReaderEntry>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            strategy: Strategy::Locked,
            wait_timeout_ms: u64::try_from(DEFAULT_WAIT_TIMEOUT.as_millis()).unwrap_or(5_000),
            duration_secs: 10,
            producers: Vec::new(),
            consumers: Vec::new(),
            writers: Vec::new(),
            readers: Vec::new(),
        }
    }
}

impl SimulationConfig {
    /// Reads and validates a simulation file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Unreadable`] when the file cannot be read,
    /// [`ConfigError::Malformed`] for malformed TOML and
    /// [`ConfigError::Invalid`] when [`SimulationConfig::validate`] fails.
    pub fn from_path<V: Into<PathBuf>>(target: V) -> ConfigResult<Self> {
        let config: Self = from_path(target)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values no pool or role could run with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be positive".into()));
        }

        for (index, consumer) in self.consumers.iter().enumerate() {
            if !(0.0..=1.0).contains(&consumer.cancel_probability) {
                return Err(ConfigError::Invalid(format!(
                    "consumers[{index}].cancel_probability must be within [0, 1], got {}",
                    consumer.cancel_probability
                )));
            }
            if consumer.hold_min_ms > consumer.hold_max_ms {
                return Err(ConfigError::Invalid(format!(
                    "consumers[{index}].hold_min_ms exceeds hold_max_ms"
                )));
            }
        }

        for (index, writer) in self.writers.iter().enumerate() {
            let given = [
                writer.price.is_some(),
                writer.location.is_some(),
                writer.event_name.is_some(),
            ];
            if given.iter().any(|set| *set) && !given.iter().all(|set| *set) {
                return Err(ConfigError::Invalid(format!(
                    "writers[{index}] must set price, location and event_name together"
                )));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.capacity).wait_timeout(self.wait_timeout())
    }
}

impl FromStr for SimulationConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: Self = from_toml(content)?;
        config.validate()?;
        Ok(config)
    }
}

fn pacing(interval_ms: u64, attempts: usize) -> WorkerConfig {
    WorkerConfig::new(Duration::from_millis(interval_ms), attempts)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerEntry {
    pub event_name: String,
    pub vendor_name: String,
    pub location: String,
    pub price: f64,
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
    pub interval_ms: u64,
    pub attempts: usize,
    /// Number of identical producers to start.
    pub count: usize,
}

impl Default for ProducerEntry {
    fn default() -> Self {
        Self {
            event_name: "Concert".into(),
            vendor_name: "Vendor".into(),
            location: "Colombo".into(),
            price: 100.0,
            max_retries: ProducerConfig::DEFAULT_MAX_RETRIES,
            retry_backoff_ms: 500,
            interval_ms: 1000,
            attempts: 10,
            count: 1,
        }
    }
}

impl ProducerEntry {
    #[must_use]
    pub fn pacing(&self) -> WorkerConfig {
        pacing(self.interval_ms, self.attempts)
    }

    #[must_use]
    pub fn payload(&self) -> ProducerConfig {
        ProducerConfig::new(&*self.event_name, &*self.vendor_name, &*self.location, self.price)
            .max_retries(self.max_retries)
            .retry_backoff(Duration::from_millis(self.retry_backoff_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerEntry {
    pub cancel_probability: f64,
    pub hold_min_ms: u64,
    pub hold_max_ms: u64,
    pub interval_ms: u64,
    pub attempts: usize,
    pub count: usize,
}

impl Default for ConsumerEntry {
    fn default() -> Self {
        Self {
            cancel_probability: ConsumerConfig::DEFAULT_CANCEL_PROBABILITY,
            hold_min_ms: 200,
            hold_max_ms: 700,
            interval_ms: 1000,
            attempts: 10,
            count: 1,
        }
    }
}

impl ConsumerEntry {
    #[must_use]
    pub fn pacing(&self) -> WorkerConfig {
        pacing(self.interval_ms, self.attempts)
    }

    #[must_use]
    pub fn payload(&self) -> ConsumerConfig {
        ConsumerConfig::new(
            self.cancel_probability,
            Duration::from_millis(self.hold_min_ms)..Duration::from_millis(self.hold_max_ms),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterEntry {
    pub price: Option<f64>,
    pub location: Option<String>,
    pub event_name: Option<String>,
    pub interval_ms: u64,
    pub attempts: usize,
    pub count: usize,
}

impl Default for WriterEntry {
    fn default() -> Self {
        Self {
            price: None,
            location: None,
            event_name: None,
            interval_ms: 1000,
            attempts: 10,
            count: 1,
        }
    }
}

impl WriterEntry {
    #[must_use]
    pub fn pacing(&self) -> WorkerConfig {
        pacing(self.interval_ms, self.attempts)
    }

    /// The fixed update, or `None` for random updates.
    #[must_use]
    pub fn update(&self) -> Option<WriterUpdate> {
        match (self.price, &self.location, &self.event_name) {
            (Some(price), Some(location), Some(event_name)) => {
                Some(WriterUpdate::new(price, location.as_str(), event_name.as_str()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderEntry {
    pub interval_ms: u64,
    pub attempts: usize,
    pub count: usize,
}

impl Default for ReaderEntry {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            attempts: 10,
            count: 1,
        }
    }
}

impl ReaderEntry {
    #[must_use]
    pub fn pacing(&self) -> WorkerConfig {
        pacing(self.interval_ms, self.attempts)
    }
}

#[cfg(test)]
mod test_simulation_config {
    use std::str::FromStr;
    use std::time::Duration;

    use tickets_core::Strategy;

    use super::SimulationConfig;
    use crate::ConfigError;

    #[test]
    fn empty_document_uses_defaults() {
        let config = SimulationConfig::from_str("").expect("should parse");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.wait_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn role_tables_fill_missing_keys() {
        let config = SimulationConfig::from_str(
            r#"
            capacity = 8
            strategy = "monitor"

            [[producers]]
            vendor_name = "Vendor-B"
            count = 2

            [[writers]]
            price = 149.99
            location = "New York"
            event_name = "Updated Concert"
            "#,
        )
        .expect("should parse");

        assert_eq!(config.capacity, 8);
        assert_eq!(config.strategy, Strategy::Monitor);
        assert_eq!(config.producers[0].vendor_name, "Vendor-B");
        assert_eq!(config.producers[0].count, 2);
        assert_eq!(config.producers[0].payload().max_retries, 3);

        let update = config.writers[0].update().expect("fixed update");
        assert_eq!(update.location, "New York");
        assert!(config.consumers.is_empty());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = SimulationConfig::from_str("capacity = 0").expect_err("should reject");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn cancel_probability_outside_unit_range_is_rejected() {
        let err = SimulationConfig::from_str("[[consumers]]\ncancel_probability = 1.5")
            .expect_err("should reject");
        assert!(err.to_string().contains("consumers[0].cancel_probability"));
    }

    #[test]
    fn partial_writer_update_is_rejected() {
        let err = SimulationConfig::from_str("[[writers]]\nprice = 10.0")
            .expect_err("should reject");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_strategy_fails_to_parse() {
        let err = SimulationConfig::from_str("strategy = \"spinlock\"").expect_err("should reject");
        assert!(matches!(err, ConfigError::Malformed(_)));
    }
}
