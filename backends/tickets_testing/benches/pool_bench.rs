use std::sync::Arc;
use std::thread;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use tickets_core::{PoolConfig, Strategy, TicketPool};

const CAPACITY: usize = 1_000;

fn pool(strategy: Strategy) -> Arc<dyn TicketPool> {
    strategy
        .build_with(PoolConfig::new(CAPACITY).wait_timeout(Duration::from_millis(100)))
        .expect("should build pool")
}

fn filled(strategy: Strategy, count: usize) -> Arc<dyn TicketPool> {
    let pool = pool(strategy);
    for n in 0..count {
        let ticket = pool.create_ticket(&format!("Event-{n}"), "Vendor", "Arena", 42.0);
        pool.add(ticket).expect("should add");
    }
    pool
}

/// Benchmark filling an empty pool up to capacity.
fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_add_to_capacity");
    for strategy in Strategy::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &strategy, |b, &strategy| {
            b.iter_batched(
                || pool(strategy),
                |pool| {
                    for n in 0..CAPACITY {
                        let ticket = pool.create_ticket("Event", "Vendor", "Arena", black_box(n as f64));
                        pool.add(ticket).expect("should add");
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmark buying every ticket of a full pool.
fn bench_purchase(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_purchase_all");
    for strategy in Strategy::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &strategy, |b, &strategy| {
            b.iter_batched(
                || filled(strategy, CAPACITY),
                |pool| {
                    for _ in 0..CAPACITY {
                        black_box(pool.purchase().expect("should purchase"));
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmark a single purchase and cancel round trip.
fn bench_purchase_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_purchase_cancel");
    for strategy in Strategy::ALL {
        let pool = filled(strategy, 64);
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &pool, |b, pool| {
            b.iter(|| {
                let ticket = pool.purchase().expect("should purchase");
                pool.cancel(black_box(&ticket)).expect("should cancel");
            });
        });
    }
    group.finish();
}

/// Benchmark four threads racing purchase and cancel over a small pool.
fn bench_contended_round_trips(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_contended_round_trips_4_threads");
    group.sample_size(20);
    for strategy in Strategy::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &strategy, |b, &strategy| {
            b.iter_batched(
                || filled(strategy, 8),
                |pool| {
                    let handles: Vec<_> = (0..4)
                        .map(|_| {
                            let pool = Arc::clone(&pool);
                            thread::spawn(move || {
                                for _ in 0..250 {
                                    let ticket = pool.purchase().expect("should purchase");
                                    pool.cancel(&ticket).expect("should cancel");
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().expect("should join");
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_add,
    bench_purchase,
    bench_purchase_cancel,
    bench_contended_round_trips
);
criterion_main!(benches);
