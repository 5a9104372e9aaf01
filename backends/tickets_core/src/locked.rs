//! Explicit-lock ticket pool: one mutex and two condition variables.
//!
//! `not_full` is awaited by `add`; `not_empty` is awaited by `purchase` and
//! `random_available`. Both waits use the native timed wait of the condvar
//! and stop as soon as it reports a timeout with the condition still false.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use rand::Rng;

use crate::pool::Deadline;
use crate::{
    PoolConfig, PoolError, PoolResult, PoolStatus, Strategy, Ticket, TicketId, TicketIdGenerator,
    TicketPool,
};

#[derive(Debug, Default)]
struct LockedState {
    tickets: Vec<Ticket>,
    sold: usize,
    closed: bool,
}

impl LockedState {
    fn available(&self) -> usize {
        self.tickets.len() - self.sold
    }

    fn position(&self, id: TicketId) -> Option<usize> {
        self.tickets.iter().position(|ticket| ticket.id() == id)
    }
}

/// `LockedTicketPool` keeps one flagged collection behind an explicit lock.
#[derive(Debug)]
pub struct LockedTicketPool {
    capacity: usize,
    wait_timeout: Duration,
    ids: TicketIdGenerator,
    state: Mutex<LockedState>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl LockedTicketPool {
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
            state: Mutex::new(LockedState {
                tickets: Vec::with_capacity(config.get_capacity()),
                sold: 0,
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LockedState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Awaits `condition` while `blocked` holds.
    fn await_while<'a, F>(
        &'a self,
        mut guard: MutexGuard<'a, LockedState>,
        condition: &Condvar,
        operation: &'static str,
        blocked: F,
    ) -> PoolResult<MutexGuard<'a, LockedState>>
    where
        F: Fn(&LockedState) -> bool,
    {
        let deadline = Deadline::after(self.wait_timeout);
        while blocked(&*guard) {
            if guard.closed {
                return Err(PoolError::Closed);
            }

            let Some(remaining) = deadline.remaining() else {
                tracing::debug!("{operation} ran out of wait budget");
                return Err(PoolError::Timeout);
            };

            let (next, result) = match condition.wait_timeout(guard, remaining) {
                Ok(waited) => waited,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard = next;

            if result.timed_out() && blocked(&*guard) {
                tracing::debug!("{operation} timed out after {:?}", self.wait_timeout);
                return Err(PoolError::Timeout);
            }
        }

        if guard.closed {
            return Err(PoolError::Closed);
        }
        Ok(guard)
    }

    fn pick_random(state: &LockedState) -> Option<Ticket> {
        let available = state.available();
        if available == 0 {
            return None;
        }

        let nth = rand::rng().random_range(0..available);
        state.tickets.iter().filter(|ticket| !ticket.is_sold()).nth(nth).cloned()
    }
}

impl TicketPool for LockedTicketPool {
    fn strategy(&self) -> Strategy {
        Strategy::Locked
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

        let guard = self.lock();
        if guard.closed {
            return Err(PoolError::Closed);
        }
        if guard.position(ticket.id()).is_some() {
            return Err(PoolError::Duplicate(ticket.id()));
        }
        let mut guard = self.await_while(guard, &self.not_full, "add", |state| {
            state.tickets.len() >= self.capacity
        })?;

        // another caller may have added the same ticket while we waited
        if guard.position(ticket.id()).is_some() {
            return Err(PoolError::Duplicate(ticket.id()));
        }

        ticket.set_sold(false);
        guard.tickets.push(ticket);
        debug_assert!(guard.tickets.len() <= self.capacity, "locked pool exceeded its capacity");

        drop(guard);
        self.not_empty.notify_all();
        Ok(())
    }

    fn purchase(&self) -> PoolResult<Ticket> {
        let guard = self.lock();
        let mut guard = self.await_while(guard, &self.not_empty, "purchase", |state| {
            state.available() == 0
        })?;

        let Some(ticket) = guard.tickets.iter_mut().find(|ticket| !ticket.is_sold()) else {
            return Err(PoolError::Timeout);
        };
        ticket.set_sold(true);
        let snapshot = ticket.clone();
        guard.sold += 1;

        drop(guard);
        self.not_full.notify_all();
        Ok(snapshot)
    }

    fn cancel(&self, ticket: &Ticket) -> PoolResult<()> {
        let mut guard = self.lock();

        let Some(index) = guard.position(ticket.id()) else {
            tracing::warn!("Rejected cancel of ticket {}: not a member", ticket.id());
            return Err(PoolError::NotAMember(ticket.id()));
        };
        if !guard.tickets[index].is_sold() {
            tracing::warn!("Rejected cancel of ticket {}: not sold", ticket.id());
            return Err(PoolError::NotSold(ticket.id()));
        }

        guard.tickets[index].set_sold(false);
        guard.sold -= 1;

        drop(guard);
        self.not_empty.notify_all();
        Ok(())
    }

    fn update(
        &self,
        id: TicketId,
        price: f64,
        location: &str,
        event_name: &str,
    ) -> PoolResult<()> {
        let mut guard = self.lock();

        let Some(index) = guard.position(id) else {
            tracing::warn!("Failed to update ticket {id}: not found");
            return Err(PoolError::NotFound(id));
        };
        guard.tickets[index].apply_update(price, location, event_name);
        Ok(())
    }

    fn random_available(&self) -> PoolResult<Ticket> {
        let guard = self.lock();
        let guard = self.await_while(guard, &self.not_empty, "random_available", |state| {
            state.available() == 0
        })?;

        Self::pick_random(&guard).ok_or(PoolError::Timeout)
    }

    fn get(&self, id: TicketId) -> Option<Ticket> {
        let guard = self.lock();
        guard.position(id).map(|index| guard.tickets[index].clone())
    }

    fn size(&self) -> usize {
        self.lock().tickets.len()
    }

    fn available_count(&self) -> usize {
        self.lock().available()
    }

    fn sold_count(&self) -> usize {
        self.lock().sold
    }

    fn status(&self) -> PoolStatus {
        let guard = self.lock();
        PoolStatus {
            strategy: Strategy::Locked,
            capacity: self.capacity,
            size: guard.tickets.len(),
            available: guard.available(),
            sold: guard.sold,
            closed: guard.closed,
        }
    }

    fn all_tickets(&self) -> Vec<Ticket> {
        self.lock().tickets.clone()
    }

    fn available_tickets(&self) -> Vec<Ticket> {
        self.lock()
            .tickets
            .iter()
            .filter(|ticket| !ticket.is_sold())
            .cloned()
            .collect()
    }

    fn close(&self) {
        let mut guard = self.lock();
        guard.closed = true;
        drop(guard);

        tracing::info!("Locked ticket pool closed");
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
