//! Queue-backed ticket pool.
//!
//! Admission goes through a bounded [`ConcurrentQueue`] used as a slot
//! counter: a successful push claims a slot, so the capacity holds without a
//! lock. Tickets never leave a pool, so nothing pops it. Ticket records live behind a
//! [`RwLock`]: scans run under the read lock, and every flip of the sold flag
//! re-validates the candidate under the write lock first (optimistic read,
//! pessimistic commit). Waiters sleep on a [`StockSignal`] generation counter
//! instead of polling.

use std::sync::{Condvar, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use concurrent_queue::{ConcurrentQueue, PushError};
use rand::Rng;

use crate::pool::Deadline;
use crate::{
    PoolConfig, PoolError, PoolResult, PoolStatus, Strategy, Ticket, TicketId, TicketIdGenerator,
    TicketPool,
};

#[derive(Debug, Default)]
struct SignalState {
    generation: u64,
    closed: bool,
}

/// `StockSignal` lets waiters sleep until the pool changed since they last
/// looked at it.
///
/// A waiter reads the generation *before* scanning, so a change that lands
/// between the scan and the wait still wakes it.
#[derive(Debug, Default)]
struct StockSignal {
    state: Mutex<SignalState>,
    changed: Condvar,
}

impl StockSignal {
    fn lock(&self) -> MutexGuard<'_, SignalState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn generation(&self) -> PoolResult<u64> {
        let guard = self.lock();
        if guard.closed {
            return Err(PoolError::Closed);
        }
        Ok(guard.generation)
    }

    fn bump(&self) {
        let mut guard = self.lock();
        guard.generation = guard.generation.wrapping_add(1);
        drop(guard);
        self.changed.notify_all();
    }

    fn close(&self) {
        let mut guard = self.lock();
        guard.closed = true;
        drop(guard);
        self.changed.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Waits until the generation moves past `seen`.
    fn wait_past(&self, seen: u64, deadline: &Deadline) -> PoolResult<()> {
        let mut guard = self.lock();
        loop {
            if guard.closed {
                return Err(PoolError::Closed);
            }
            if guard.generation != seen {
                return Ok(());
            }

            let Some(remaining) = deadline.remaining() else {
                return Err(PoolError::Timeout);
            };
            guard = match self.changed.wait_timeout(guard, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

/// `QueuedTicketPool` combines a bounded concurrent queue with a
/// read/write lock for the invariants the queue cannot express.
#[derive(Debug)]
pub struct QueuedTicketPool {
    capacity: usize,
    wait_timeout: Duration,
    ids: TicketIdGenerator,
    /// One unit per admitted ticket. Only its length is read: the bounded
    /// push is the capacity check and `len()` backs [`TicketPool::size`].
    /// Membership and the sold flag live in `records`.
    roster: ConcurrentQueue<()>,
    records: RwLock<Vec<Ticket>>,
    signal: StockSignal,
}

impl QueuedTicketPool {
    /// # Errors
    ///
    /// [`PoolError::InvalidCapacity`] for a zero capacity.
    pub fn new(capacity: usize) -> PoolResult<Self> {
        Self::with_config(PoolConfig::new(capacity))
    }

    /// # Errors
    ///
    /// [`PoolError::InvalidCapacity`] for a zero capacity.
    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self {
            capacity: config.get_capacity(),
            wait_timeout: config.get_wait_timeout(),
            ids: TicketIdGenerator::new(),
            roster: ConcurrentQueue::bounded(config.get_capacity()),
            records: RwLock::new(Vec::with_capacity(config.get_capacity())),
            signal: StockSignal::default(),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Ticket>> {
        match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Ticket>> {
        match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Optimistic scan: identities that looked unsold under the read lock.
    fn unsold_ids(&self) -> Vec<TicketId> {
        self.read()
            .iter()
            .filter(|ticket| !ticket.is_sold())
            .map(Ticket::id)
            .collect()
    }

    /// Pessimistic commit: sells `id` only if it is still unsold.
    fn try_sell(&self, id: TicketId) -> Option<Ticket> {
        let mut records = self.write();
        let ticket = records.iter_mut().find(|ticket| ticket.id() == id)?;
        if ticket.is_sold() {
            return None;
        }
        ticket.set_sold(true);
        Some(ticket.clone())
    }

    /// Re-validates a candidate picked from a stale snapshot.
    fn still_available(&self, id: TicketId) -> Option<Ticket> {
        self.read()
            .iter()
            .find(|ticket| ticket.id() == id && !ticket.is_sold())
            .cloned()
    }
}

impl TicketPool for QueuedTicketPool {
    fn strategy(&self) -> Strategy {
        Strategy::Queued
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    fn create_ticket(
        &self,
        event_name: &str,
        vendor_name: &str,
        location: &str,
        price: f64,
    ) -> Ticket {
        Ticket::new(self.ids.next_id(), event_name, vendor_name, location, price)
    }

    fn add(&self, mut ticket: Ticket) -> PoolResult<()> {
        if !self.ids.issued(ticket.id()) {
            tracing::warn!("Rejected add of ticket {}: created by another pool", ticket.id());
            return Err(PoolError::NotAMember(ticket.id()));
        }

        let deadline = Deadline::after(self.wait_timeout);
        loop {
            let seen = self.signal.generation()?;
            {
                let mut records = self.write();
                if records.iter().any(|held| held.id() == ticket.id()) {
                    return Err(PoolError::Duplicate(ticket.id()));
                }

                match self.roster.push(()) {
                    Ok(()) => {
                        ticket.set_sold(false);
                        records.push(ticket);
                        debug_assert!(
                            records.len() <= self.capacity,
                            "queued pool exceeded its capacity"
                        );
                        drop(records);
                        self.signal.bump();
                        return Ok(());
                    }
                    Err(PushError::Full(_)) => {}
                    Err(PushError::Closed(_)) => return Err(PoolError::Closed),
                }
            }

            if let Err(err) = self.signal.wait_past(seen, &deadline) {
                if err.is_timeout() {
                    tracing::debug!("add timed out after {:?}", self.wait_timeout);
                }
                return Err(err);
            }
        }
    }

    fn purchase(&self) -> PoolResult<Ticket> {
        let deadline = Deadline::after(self.wait_timeout);
        loop {
            let seen = self.signal.generation()?;

            for id in self.unsold_ids() {
                if let Some(ticket) = self.try_sell(id) {
                    self.signal.bump();
                    return Ok(ticket);
                }
                tracing::debug!("Lost the race for ticket {id}, trying the next one");
            }

            if let Err(err) = self.signal.wait_past(seen, &deadline) {
                if err.is_timeout() {
                    tracing::debug!("purchase timed out after {:?}", self.wait_timeout);
                }
                return Err(err);
            }
        }
    }

    fn cancel(&self, ticket: &Ticket) -> PoolResult<()> {
        let mut records = self.write();

        let Some(held) = records.iter_mut().find(|held| held.id() == ticket.id()) else {
            tracing::warn!("Rejected cancel of ticket {}: not a member", ticket.id());
            return Err(PoolError::NotAMember(ticket.id()));
        };
        if !held.is_sold() {
            tracing::warn!("Rejected cancel of ticket {}: not sold", ticket.id());
            return Err(PoolError::NotSold(ticket.id()));
        }
        held.set_sold(false);

        drop(records);
        self.signal.bump();
        Ok(())
    }

    fn update(
        &self,
        id: TicketId,
        price: f64,
        location: &str,
        event_name: &str,
    ) -> PoolResult<()> {
        let mut records = self.write();

        let Some(ticket) = records.iter_mut().find(|ticket| ticket.id() == id) else {
            tracing::warn!("Failed to update ticket {id}: not found");
            return Err(PoolError::NotFound(id));
        };
        ticket.apply_update(price, location, event_name);
        Ok(())
    }

    fn random_available(&self) -> PoolResult<Ticket> {
        let deadline = Deadline::after(self.wait_timeout);
        loop {
            let seen = self.signal.generation()?;

            let mut candidates = self.unsold_ids();
            while !candidates.is_empty() {
                let index = rand::rng().random_range(0..candidates.len());
                let id = candidates.swap_remove(index);
                if let Some(ticket) = self.still_available(id) {
                    return Ok(ticket);
                }
            }

            self.signal.wait_past(seen, &deadline)?;
        }
    }

    fn get(&self, id: TicketId) -> Option<Ticket> {
        self.read().iter().find(|ticket| ticket.id() == id).cloned()
    }

    /// Reads the admission queue without taking the records lock.
    fn size(&self) -> usize {
        self.roster.len()
    }

    fn available_count(&self) -> usize {
        self.read().iter().filter(|ticket| !ticket.is_sold()).count()
    }

    fn sold_count(&self) -> usize {
        self.read().iter().filter(|ticket| ticket.is_sold()).count()
    }

    fn status(&self) -> PoolStatus {
        let records = self.read();
        let sold = records.iter().filter(|ticket| ticket.is_sold()).count();
        PoolStatus {
            strategy: Strategy::Queued,
            capacity: self.capacity,
            size: records.len(),
            available: records.len() - sold,
            sold,
            closed: self.signal.is_closed(),
        }
    }

    fn all_tickets(&self) -> Vec<Ticket> {
        self.read().clone()
    }

    fn available_tickets(&self) -> Vec<Ticket> {
        self.read()
            .iter()
            .filter(|ticket| !ticket.is_sold())
            .cloned()
            .collect()
    }

    fn close(&self) {
        self.signal.close();
        self.roster.close();
        tracing::info!("Queued ticket pool closed");
    }

    fn is_closed(&self) -> bool {
        self.signal.is_closed()
    }
}
