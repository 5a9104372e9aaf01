//! Contract tests run against every ticket pool strategy.
//!
//! Each test builds one pool per [`Strategy`] and checks the same
//! externally observable guarantees.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use ntest::timeout;
use serial_test::serial;
use tickets_core::{PoolConfig, PoolError, Strategy, TicketPool};

const SHORT_WAIT: Duration = Duration::from_millis(150);

fn build(strategy: Strategy, capacity: usize, wait: Duration) -> Arc<dyn TicketPool> {
    strategy
        .build_with(PoolConfig::new(capacity).wait_timeout(wait))
        .expect("should build pool")
}

fn fill(pool: &Arc<dyn TicketPool>, count: usize) {
    for n in 0..count {
        let ticket = pool.create_ticket(
            &format!("Event-{n}"),
            "Vendor-A",
            &format!("Location-{n}"),
            100.0 + n as f64,
        );
        pool.add(ticket).expect("should add");
    }
}

#[test]
fn scenario_a_five_adds_five_purchases_then_timeout() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 5, SHORT_WAIT);
        fill(&pool, 5);
        assert_eq!(pool.size(), 5, "{strategy}");

        for _ in 0..5 {
            pool.purchase().expect("should purchase");
        }
        assert_eq!(pool.sold_count(), 5, "{strategy}");
        assert_eq!(pool.available_count(), 0, "{strategy}");

        let started = Instant::now();
        assert_eq!(pool.purchase(), Err(PoolError::Timeout), "{strategy}");
        assert!(started.elapsed() >= SHORT_WAIT, "{strategy} returned early");
    }
}

#[test]
#[serial]
#[timeout(10000)]
fn scenario_b_blocked_consumer_receives_later_ticket() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 100, Duration::from_secs(5));

        let consumer = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let started = Instant::now();
                (pool.purchase(), started.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(100));
        let ticket = pool.create_ticket("Late Show", "Vendor-B", "Berlin", 55.0);
        let expected = ticket.id();
        pool.add(ticket).expect("should add");

        let (bought, waited) = consumer.join().expect("should join");
        let bought = bought.expect("consumer should receive the ticket");
        assert_eq!(bought.id(), expected, "{strategy}");
        assert!(waited < Duration::from_secs(2), "{strategy} waited {waited:?}");
    }
}

#[test]
fn scenario_c_update_changes_exactly_three_fields() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 10, SHORT_WAIT);
        fill(&pool, 10);

        let id = pool
            .all_tickets()
            .into_iter()
            .map(|ticket| ticket.id())
            .find(|id| id.value() == 7)
            .expect("ticket 7 should be a member");
        let before = pool.get(id).expect("should get ticket 7");

        pool.update(id, 149.99, "New York", "Updated Concert")
            .expect("should update");

        let after = pool.get(id).expect("should get ticket 7");
        assert_eq!(after.id(), before.id(), "{strategy}");
        assert_eq!(after.is_sold(), before.is_sold(), "{strategy}");
        assert_eq!(after.vendor_name(), before.vendor_name(), "{strategy}");
        assert_eq!(after.location(), "New York", "{strategy}");
        assert_eq!(after.event_name(), "Updated Concert", "{strategy}");
        assert!((after.price() - 149.99).abs() < f64::EPSILON, "{strategy}");
    }
}

#[test]
fn update_of_unknown_identity_is_a_reported_no_op() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 2, SHORT_WAIT);
        fill(&pool, 1);
        // created but never added, so its identity is unknown to the pool
        let stranger = pool.create_ticket("x", "y", "z", 1.0);

        assert_eq!(
            pool.update(stranger.id(), 1.0, "Nowhere", "Nothing"),
            Err(PoolError::NotFound(stranger.id())),
            "{strategy}"
        );
        let kept = pool.all_tickets();
        assert_eq!(kept.len(), 1, "{strategy}");
        assert_eq!(kept[0].location(), "Location-0", "{strategy}");
    }
}

#[test]
#[timeout(20000)]
fn concurrent_purchases_are_at_most_once() {
    const BUYERS: usize = 32;

    for strategy in Strategy::ALL {
        let pool = build(strategy, BUYERS, SHORT_WAIT);
        fill(&pool, BUYERS);

        let start = Arc::new(Barrier::new(BUYERS));
        let handles: Vec<_> = (0..BUYERS)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    pool.purchase()
                })
            })
            .collect();

        let ids: HashSet<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("should join").expect("should purchase").id())
            .collect();

        assert_eq!(ids.len(), BUYERS, "{strategy} handed out a ticket twice");
        assert_eq!(pool.purchase(), Err(PoolError::Timeout), "{strategy}");
    }
}

#[test]
fn purchase_then_cancel_round_trips() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 1, SHORT_WAIT);
        fill(&pool, 1);
        let available_before = pool.available_count();

        let ticket = pool.purchase().expect("should purchase");
        assert_eq!(pool.available_count(), available_before - 1, "{strategy}");

        pool.cancel(&ticket).expect("should cancel");
        assert_eq!(pool.available_count(), available_before, "{strategy}");
        assert_eq!(pool.sold_count(), 0, "{strategy}");
        assert!(!pool.get(ticket.id()).expect("still a member").is_sold(), "{strategy}");
    }
}

#[test]
fn cancel_of_foreign_ticket_with_the_same_number_is_rejected() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 2, SHORT_WAIT);
        let other = build(strategy, 2, SHORT_WAIT);
        fill(&pool, 1);
        fill(&other, 1);

        let mine = pool.purchase().expect("should purchase");
        let foreign = other.purchase().expect("should purchase");
        assert_eq!(mine.id().value(), foreign.id().value(), "{strategy}");

        assert_eq!(
            pool.cancel(&foreign),
            Err(PoolError::NotAMember(foreign.id())),
            "{strategy}"
        );
        assert_eq!(pool.sold_count(), 1, "{strategy}");
        assert_eq!(pool.available_count(), 0, "{strategy}");
        assert!(pool.get(mine.id()).is_some_and(|held| held.is_sold()), "{strategy}");
        assert_eq!(other.sold_count(), 1, "{strategy}");
    }
}

#[test]
fn add_of_ticket_created_by_another_pool_is_rejected() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 2, SHORT_WAIT);
        let other = build(strategy, 2, SHORT_WAIT);

        let foreign = other.create_ticket("Elsewhere", "Vendor-Z", "Mars", 1.0);
        assert_eq!(
            pool.add(foreign.clone()),
            Err(PoolError::NotAMember(foreign.id())),
            "{strategy}"
        );
        assert_eq!(pool.size(), 0, "{strategy}");

        let own = pool.create_ticket("Concert", "Vendor-A", "London", 80.0);
        assert_eq!(own.id().value(), foreign.id().value(), "{strategy}");
        assert_eq!(pool.add(own), Ok(()), "{strategy}");
        assert_eq!(pool.size(), 1, "{strategy}");
    }
}

#[test]
fn duplicate_add_on_a_full_pool_fails_without_waiting() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 1, Duration::from_secs(5));
        let ticket = pool.create_ticket("Gig", "Vendor-A", "Dublin", 25.0);
        pool.add(ticket.clone()).expect("should add");

        let started = Instant::now();
        assert_eq!(
            pool.add(ticket.clone()),
            Err(PoolError::Duplicate(ticket.id())),
            "{strategy}"
        );
        assert!(started.elapsed() < Duration::from_secs(1), "{strategy} waited for a slot");
        assert_eq!(pool.size(), 1, "{strategy}");
    }
}

#[test]
#[timeout(20000)]
fn concurrent_updates_never_mix_fields() {
    const WRITERS: usize = 16;

    for strategy in Strategy::ALL {
        let pool = build(strategy, 1, SHORT_WAIT);
        fill(&pool, 1);
        let id = pool.all_tickets()[0].id();

        let start = Arc::new(Barrier::new(WRITERS));
        let handles: Vec<_> = (0..WRITERS)
            .map(|writer| {
                let pool = Arc::clone(&pool);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    for _ in 0..50 {
                        pool.update(
                            id,
                            writer as f64,
                            &format!("Location-{writer}"),
                            &format!("Event-{writer}"),
                        )
                        .expect("should update");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("should join");
        }

        let ticket = pool.get(id).expect("should get");
        let writer = ticket.price() as usize;
        assert!(writer < WRITERS, "{strategy}");
        assert_eq!(ticket.location(), format!("Location-{writer}"), "{strategy}");
        assert_eq!(ticket.event_name(), format!("Event-{writer}"), "{strategy}");
    }
}

#[test]
fn capacity_boundary_times_out_without_overflow() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 4, SHORT_WAIT);
        fill(&pool, 4);

        let extra = pool.create_ticket("Overflow", "Vendor-A", "Nowhere", 1.0);
        let extra_id = extra.id();
        let started = Instant::now();
        assert_eq!(pool.add(extra), Err(PoolError::Timeout), "{strategy}");
        assert!(started.elapsed() >= SHORT_WAIT, "{strategy} returned early");

        assert_eq!(pool.size(), 4, "{strategy}");
        assert!(pool.get(extra_id).is_none(), "{strategy}");
    }
}

#[test]
#[serial]
#[timeout(30000)]
fn counts_never_exceed_capacity_under_mixed_load() {
    const CAPACITY: usize = 20;

    for strategy in Strategy::ALL {
        let pool = build(strategy, CAPACITY, Duration::from_millis(20));
        let start = Arc::new(Barrier::new(12));
        let mut handles = Vec::new();

        for producer in 0..4 {
            let pool = Arc::clone(&pool);
            let start = Arc::clone(&start);
            handles.push(thread::spawn(move || {
                start.wait();
                for n in 0..15 {
                    let ticket = pool.create_ticket(
                        &format!("Event-{producer}-{n}"),
                        &format!("Vendor-{producer}"),
                        "Arena",
                        50.0,
                    );
                    let _ = pool.add(ticket);
                }
            }));
        }

        for _ in 0..4 {
            let pool = Arc::clone(&pool);
            let start = Arc::clone(&start);
            handles.push(thread::spawn(move || {
                start.wait();
                for n in 0..15 {
                    if let Ok(ticket) = pool.purchase() {
                        if n % 3 == 0 {
                            pool.cancel(&ticket).expect("own purchase should cancel");
                        }
                    }
                }
            }));
        }

        for _ in 0..4 {
            let pool = Arc::clone(&pool);
            let start = Arc::clone(&start);
            handles.push(thread::spawn(move || {
                start.wait();
                for _ in 0..30 {
                    let status = pool.status();
                    assert!(status.available + status.sold <= status.capacity);
                    assert_eq!(status.available + status.sold, status.size);
                    assert!(pool.size() <= pool.capacity());
                }
            }));
        }

        for handle in handles {
            handle.join().expect("should join");
        }

        let status = pool.status();
        assert!(status.size <= CAPACITY, "{strategy}");
        assert_eq!(status.available + status.sold, status.size, "{strategy}");
        let ids: HashSet<_> = pool.all_tickets().iter().map(|ticket| ticket.id()).collect();
        assert_eq!(ids.len(), status.size, "{strategy} holds duplicate identities");
    }
}

#[test]
#[timeout(10000)]
fn close_releases_every_blocked_caller() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 1, Duration::from_secs(30));
        fill(&pool, 1);
        pool.purchase().expect("should purchase");

        let purchaser = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.purchase())
        };
        let peeker = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.random_available())
        };
        let adder = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let ticket = pool.create_ticket("Late", "Vendor", "Nowhere", 1.0);
                pool.add(ticket)
            })
        };

        thread::sleep(Duration::from_millis(100));
        pool.close();

        assert_eq!(purchaser.join().expect("should join"), Err(PoolError::Closed), "{strategy}");
        assert_eq!(peeker.join().expect("should join").map(|_| ()), Err(PoolError::Closed), "{strategy}");
        assert_eq!(adder.join().expect("should join"), Err(PoolError::Closed), "{strategy}");

        assert!(pool.status().closed, "{strategy}");
        assert_eq!(pool.sold_count(), 1, "{strategy}");
    }
}

#[test]
fn random_available_does_not_sell() {
    for strategy in Strategy::ALL {
        let pool = build(strategy, 3, SHORT_WAIT);
        fill(&pool, 3);

        for _ in 0..10 {
            let peeked = pool.random_available().expect("should peek");
            assert!(!peeked.is_sold(), "{strategy}");
        }
        assert_eq!(pool.available_count(), 3, "{strategy}");
        assert_eq!(pool.sold_count(), 0, "{strategy}");
    }
}
