//! Monitor-style ticket pool: one mutex, one condition variable.
//!
//! Every operation runs inside the same critical section and every mutation
//! wakes *all* waiters, so producers waiting for space and consumers waiting
//! for stock share a single condvar and simply re-check their own condition.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use rand::Rng;

use crate::pool::Deadline;
use crate::{
    PoolConfig, PoolError, PoolResult, PoolStatus, Strategy, Ticket, TicketId, TicketIdGenerator,
    TicketPool,
};

#[derive(Debug, Default)]
struct MonitorState {
    /// Purchasable tickets in arrival order.
    unsold: VecDeque<Ticket>,
    /// Sold tickets still hold their slot until cancelled.
    sold: Vec<Ticket>,
    closed: bool,
}

impl MonitorState {
    fn size(&self) -> usize {
        self.unsold.len() + self.sold.len()
    }

    fn contains(&self, id: TicketId) -> bool {
        self.unsold.iter().chain(self.sold.iter()).any(|ticket| ticket.id() == id)
    }

    fn find(&self, id: TicketId) -> Option<&Ticket> {
        self.unsold.iter().chain(self.sold.iter()).find(|ticket| ticket.id() == id)
    }

    fn find_mut(&mut self, id: TicketId) -> Option<&mut Ticket> {
        self.unsold
            .iter_mut()
            .chain(self.sold.iter_mut())
            .find(|ticket| ticket.id() == id)
    }
}

/// `MonitorTicketPool` guards its whole state with a single monitor.
#[derive(Debug)]
pub struct MonitorTicketPool {
    capacity: usize,
    wait_timeout: Duration,
    ids: TicketIdGenerator,
    state: Mutex<MonitorState>,
    monitor: Condvar,
}

impl MonitorTicketPool {
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
            state: Mutex::new(MonitorState {
                unsold: VecDeque::with_capacity(config.get_capacity()),
                sold: Vec::with_capacity(config.get_capacity()),
                closed: false,
            }),
            monitor: Condvar::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Blocks on the monitor until `ready` holds, re-checking after every
    /// wake-up against a deadline fixed on entry.
    fn wait_until<'a, F>(
        &'a self,
        mut guard: MutexGuard<'a, MonitorState>,
        operation: &'static str,
        ready: F,
    ) -> PoolResult<MutexGuard<'a, MonitorState>>
    where
        F: Fn(&MonitorState) -> bool,
    {
        let deadline = Deadline::after(self.wait_timeout);
        loop {
            if guard.closed {
                return Err(PoolError::Closed);
            }
            if ready(&*guard) {
                return Ok(guard);
            }

            let Some(remaining) = deadline.remaining() else {
                tracing::debug!("{operation} timed out after {:?}", self.wait_timeout);
                return Err(PoolError::Timeout);
            };

            guard = match self.monitor.wait_timeout(guard, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

impl TicketPool for MonitorTicketPool {
    fn strategy(&self) -> Strategy {
        Strategy::Monitor
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
        if guard.contains(ticket.id()) {
            return Err(PoolError::Duplicate(ticket.id()));
        }
        let mut guard = self.wait_until(guard, "add", |state| {
            state.size() < self.capacity || state.contains(ticket.id())
        })?;

        // another caller may have added the same ticket while we waited
        if guard.contains(ticket.id()) {
            return Err(PoolError::Duplicate(ticket.id()));
        }

        ticket.set_sold(false);
        guard.unsold.push_back(ticket);
        debug_assert!(guard.size() <= self.capacity, "monitor pool exceeded its capacity");

        drop(guard);
        self.monitor.notify_all();
        Ok(())
    }

    fn purchase(&self) -> PoolResult<Ticket> {
        let guard = self.lock();
        let mut guard = self.wait_until(guard, "purchase", |state| !state.unsold.is_empty())?;

        let Some(mut ticket) = guard.unsold.pop_front() else {
            return Err(PoolError::Timeout);
        };
        ticket.set_sold(true);
        guard.sold.push(ticket.clone());

        drop(guard);
        self.monitor.notify_all();
        Ok(ticket)
    }

    fn cancel(&self, ticket: &Ticket) -> PoolResult<()> {
        let mut guard = self.lock();

        let Some(position) = guard.sold.iter().position(|sold| sold.id() == ticket.id()) else {
            let err = if guard.contains(ticket.id()) {
                PoolError::NotSold(ticket.id())
            } else {
                PoolError::NotAMember(ticket.id())
            };
            tracing::warn!("Rejected cancel of ticket {}: {err}", ticket.id());
            return Err(err);
        };

        let mut returned = guard.sold.swap_remove(position);
        returned.set_sold(false);
        guard.unsold.push_back(returned);

        drop(guard);
        self.monitor.notify_all();
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

        let Some(ticket) = guard.find_mut(id) else {
            tracing::warn!("Failed to update ticket {id}: not found");
            return Err(PoolError::NotFound(id));
        };
        ticket.apply_update(price, location, event_name);

        drop(guard);
        self.monitor.notify_all();
        Ok(())
    }

    fn random_available(&self) -> PoolResult<Ticket> {
        let guard = self.lock();
        let guard = self.wait_until(guard, "random_available", |state| !state.unsold.is_empty())?;

        let index = rand::rng().random_range(0..guard.unsold.len());
        guard.unsold.get(index).cloned().ok_or(PoolError::Timeout)
    }

    fn get(&self, id: TicketId) -> Option<Ticket> {
        self.lock().find(id).cloned()
    }

    fn size(&self) -> usize {
        self.lock().size()
    }

    fn available_count(&self) -> usize {
        self.lock().unsold.len()
    }

    fn sold_count(&self) -> usize {
        self.lock().sold.len()
    }

    fn status(&self) -> PoolStatus {
        let guard = self.lock();
        PoolStatus {
            strategy: Strategy::Monitor,
            capacity: self.capacity,
            size: guard.size(),
            available: guard.unsold.len(),
            sold: guard.sold.len(),
            closed: guard.closed,
        }
    }

    fn all_tickets(&self) -> Vec<Ticket> {
        let guard = self.lock();
        guard.unsold.iter().chain(guard.sold.iter()).cloned().collect()
    }

    fn available_tickets(&self) -> Vec<Ticket> {
        self.lock().unsold.iter().cloned().collect()
    }

    fn close(&self) {
        let mut guard = self.lock();
        guard.closed = true;
        drop(guard);

        tracing::info!("Monitor ticket pool closed");
        self.monitor.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[cfg(test)]
mod test_monitor_pool {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use tracing_test::traced_test;

    use super::MonitorTicketPool;
    use crate::{PoolConfig, PoolError, TicketPool};

    fn pool(capacity: usize) -> MonitorTicketPool {
        MonitorTicketPool::with_config(
            PoolConfig::new(capacity).wait_timeout(Duration::from_millis(100)),
        )
        .expect("should build pool")
    }

    #[test]
    fn purchase_moves_ticket_to_sold_side() {
        let pool = pool(2);
        let ticket = pool.create_ticket("Concert", "Vendor-A", "Paris", 40.0);
        pool.add(ticket.clone()).expect("should add");

        let bought = pool.purchase().expect("should purchase");

        assert_eq!(bought.id(), ticket.id());
        assert!(bought.is_sold());
        assert_eq!(pool.available_count(), 0);
        assert_eq!(pool.sold_count(), 1);
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn cancel_puts_ticket_back_at_the_tail() {
        let pool = pool(3);
        for n in 0..2 {
            let ticket = pool.create_ticket(&format!("Event-{n}"), "Vendor", "Rome", 10.0);
            pool.add(ticket).expect("should add");
        }

        let first = pool.purchase().expect("should purchase");
        pool.cancel(&first).expect("should cancel");

        let order: Vec<_> = pool.available_tickets().iter().map(|t| t.id()).collect();
        assert_eq!(order.last(), Some(&first.id()));
        assert_eq!(pool.sold_count(), 0);
    }

    #[test]
    #[traced_test]
    fn cancel_of_unsold_member_is_rejected() {
        let pool = pool(1);
        let ticket = pool.create_ticket("Concert", "Vendor", "Oslo", 10.0);
        pool.add(ticket.clone()).expect("should add");

        assert_eq!(pool.cancel(&ticket), Err(PoolError::NotSold(ticket.id())));
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn close_wakes_blocked_purchaser() {
        let pool = Arc::new(
            MonitorTicketPool::with_config(
                PoolConfig::new(1).wait_timeout(Duration::from_secs(10)),
            )
            .expect("should build pool"),
        );

        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.purchase())
        };

        thread::sleep(Duration::from_millis(50));
        pool.close();

        assert_eq!(waiter.join().expect("should join"), Err(PoolError::Closed));
        assert!(pool.is_closed());
    }
}
