use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::derive::Display;

/// Source of the per-pool tags carried by every [`TicketId`].
static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1);

/// `TicketId` is the pool-assigned identity of a [`Ticket`].
///
/// Each pool numbers its tickets from 1, and every identity also carries
/// the tag of the generator that issued it. Two pools can both hand out
/// ticket 1 without those identities ever comparing equal.
///
/// Identities are handed out by [`TicketIdGenerator`] only, which is
/// why there is no public constructor.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{value}")]
pub struct TicketId {
    origin: u64,
    value: u64,
}

impl TicketId {
    /// The per-pool sequence number, starting at 1.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.value
    }
}

/// `TicketIdGenerator` hands out monotonic identities starting at 1, tagged
/// with an origin no other generator in the process shares.
#[derive(Debug)]
pub struct TicketIdGenerator {
    origin: u64,
    next: AtomicU64,
}

impl Default for TicketIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed),
            next: AtomicU64::new(1),
        }
    }

    /// Returns the next free identity.
    pub fn next_id(&self) -> TicketId {
        TicketId {
            origin: self.origin,
            value: self.next.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Whether `id` came out of this generator.
    #[must_use]
    pub const fn issued(&self, id: TicketId) -> bool {
        id.origin == self.origin
    }

    /// Returns how many identities have been allocated so far.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Acquire) - 1
    }
}

/// `Ticket` is a single allocatable unit of a pool.
///
/// The identity and vendor never change after creation; the event name,
/// location, price and sold flag are only mutated by the owning pool
/// while it holds its exclusive section. Values returned from a pool are
/// snapshots, so mutating a clone never affects pool state.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    id: TicketId,
    event_name: String,
    vendor_name: String,
    location: String,
    price: f64,
    sold: bool,
}

impl Ticket {
    pub(crate) fn new(
        id: TicketId,
        event_name: impl Into<String>,
        vendor_name: impl Into<String>,
        location: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id,
            event_name: event_name.into(),
            vendor_name: vendor_name.into(),
            location: location.into(),
            price,
            sold: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> TicketId {
        self.id
    }

    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    #[must_use]
    pub fn vendor_name(&self) -> &str {
        &self.vendor_name
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub const fn price(&self) -> f64 {
        self.price
    }

    #[must_use]
    pub const fn is_sold(&self) -> bool {
        self.sold
    }

    pub(crate) fn set_sold(&mut self, sold: bool) {
        self.sold = sold;
    }

    /// Replaces the three mutable descriptive fields in one step.
    pub(crate) fn apply_update(&mut self, price: f64, location: &str, event_name: &str) {
        self.price = price;
        location.clone_into(&mut self.location);
        event_name.clone_into(&mut self.event_name);
    }
}

impl core::fmt::Display for Ticket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Ticket#{} {} by {} @ {} ${:.2} ({})",
            self.id,
            self.event_name,
            self.vendor_name,
            self.location,
            self.price,
            if self.sold { "SOLD" } else { "AVAILABLE" }
        )
    }
}

#[cfg(test)]
mod test_tickets {
    use super::{Ticket, TicketIdGenerator};

    #[test]
    fn generator_starts_at_one_and_increments() {
        let ids = TicketIdGenerator::new();
        assert_eq!(ids.next_id().value(), 1);
        assert_eq!(ids.next_id().value(), 2);
        assert_eq!(ids.allocated(), 2);
    }

    #[test]
    fn equal_sequence_numbers_from_two_generators_differ() {
        let (first, second) = (TicketIdGenerator::new(), TicketIdGenerator::new());
        let (a, b) = (first.next_id(), second.next_id());

        assert_eq!(a.value(), b.value());
        assert_eq!(a.to_string(), "1");
        assert_ne!(a, b);
        assert!(first.issued(a));
        assert!(!first.issued(b));
    }

    #[test]
    fn update_keeps_identity_vendor_and_flag() {
        let ids = TicketIdGenerator::new();
        let mut ticket = Ticket::new(ids.next_id(), "Concert", "Vendor-A", "London", 80.0);
        ticket.set_sold(true);

        ticket.apply_update(149.99, "New York", "Updated Concert");

        assert_eq!(ticket.id().value(), 1);
        assert_eq!(ticket.vendor_name(), "Vendor-A");
        assert_eq!(ticket.location(), "New York");
        assert_eq!(ticket.event_name(), "Updated Concert");
        assert!((ticket.price() - 149.99).abs() < f64::EPSILON);
        assert!(ticket.is_sold());
    }
}
