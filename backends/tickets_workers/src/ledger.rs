//! Per-simulation tallies of what every role did.
//!
//! A [`Ledger`] is shared by all workers of one simulation run, so two runs
//! never see each other's numbers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// Tickets added, keyed by vendor name.
    pub produced: BTreeMap<String, usize>,
    /// Tickets bought, keyed by consumer name.
    pub purchased: BTreeMap<String, usize>,
    /// Tickets handed back, keyed by consumer name.
    pub cancelled: BTreeMap<String, usize>,
    pub updated: usize,
    pub read: usize,
}

impl LedgerSnapshot {
    #[must_use]
    pub fn total_produced(&self) -> usize {
        self.produced.values().sum()
    }

    #[must_use]
    pub fn total_purchased(&self) -> usize {
        self.purchased.values().sum()
    }

    #[must_use]
    pub fn total_cancelled(&self) -> usize {
        self.cancelled.values().sum()
    }

    fn write_table(
        f: &mut fmt::Formatter<'_>,
        title: &str,
        key: &str,
        value: &str,
        rows: &BTreeMap<String, usize>,
    ) -> fmt::Result {
        writeln!(f, "--- {title} ---")?;
        writeln!(f, "{key:<20} | {value:<10}")?;
        writeln!(f, "{}", "-".repeat(42))?;
        for (name, count) in rows {
            writeln!(f, "{name:<20} | {count:<10}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for LedgerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::write_table(
            f,
            "Vendor Ticket Production Summary",
            "Vendor Name",
            "Tickets Produced",
            &self.produced,
        )?;
        Self::write_table(
            f,
            "Consumer Ticket Purchase Summary",
            "Consumer Name",
            "Tickets Purchased",
            &self.purchased,
        )?;
        Self::write_table(
            f,
            "Consumer Ticket Cancellation Summary",
            "Consumer Name",
            "Tickets Cancelled",
            &self.cancelled,
        )?;
        writeln!(f, "Updates applied: {}", self.updated)?;
        write!(f, "Status reads: {}", self.read)
    }
}

/// `Ledger` collects [`LedgerSnapshot`] counts from concurrently running
/// workers.
#[derive(Debug, Default)]
pub struct Ledger {
    tallies: Mutex<LedgerSnapshot>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerSnapshot> {
        match self.tallies.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn record_produced(&self, vendor: &str) {
        *self.lock().produced.entry(vendor.to_owned()).or_default() += 1;
    }

    pub fn record_purchased(&self, consumer: &str) {
        *self.lock().purchased.entry(consumer.to_owned()).or_default() += 1;
    }

    pub fn record_cancelled(&self, consumer: &str) {
        *self.lock().cancelled.entry(consumer.to_owned()).or_default() += 1;
    }

    pub fn record_updated(&self) {
        self.lock().updated += 1;
    }

    pub fn record_read(&self) {
        self.lock().read += 1;
    }

    /// Copies the current tallies out.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.lock().clone()
    }
}

#[cfg(test)]
mod test_ledger {
    use std::sync::Arc;
    use std::thread;

    use super::Ledger;

    #[test]
    fn tallies_from_many_threads_add_up() {
        let ledger = Arc::new(Ledger::new());

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for _ in 0..25 {
                        ledger.record_produced(&format!("Vendor-{}", n % 2));
                        ledger.record_purchased("consumer-1");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("should join");
        }

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.total_produced(), 100);
        assert_eq!(snapshot.produced.get("Vendor-0"), Some(&50));
        assert_eq!(snapshot.produced.get("Vendor-1"), Some(&50));
        assert_eq!(snapshot.total_purchased(), 100);
        assert_eq!(snapshot.total_cancelled(), 0);
    }

    #[test]
    fn display_renders_a_row_per_name() {
        let ledger = Ledger::new();
        ledger.record_produced("Vendor-A");
        ledger.record_cancelled("consumer-2");
        ledger.record_updated();
        ledger.record_read();
        ledger.record_read();

        let rendered = ledger.snapshot().to_string();
        assert!(rendered.contains("Vendor Ticket Production Summary"));
        assert!(rendered.contains("Vendor-A             | 1"));
        assert!(rendered.contains("consumer-2           | 1"));
        assert!(rendered.contains("Updates applied: 1"));
        assert!(rendered.ends_with("Status reads: 2"));
    }
}
