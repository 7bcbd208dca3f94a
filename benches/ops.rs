//! Store operation benchmarks across policies and sizes.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stashkit::{PolicyKind, Store};

const POLICIES: [(&str, PolicyKind); 5] = [
    ("none", PolicyKind::None),
    ("fifo", PolicyKind::Fifo),
    ("lru", PolicyKind::Lru),
    ("lfu", PolicyKind::Lfu),
    ("ltr", PolicyKind::Ltr),
];

const SIZES: [u64; 3] = [100, 10_000, 100_000];

fn populated_store(policy: PolicyKind, entries: u64) -> Store {
    let mut store = Store::new();
    store.set_policy(policy);
    for i in 0..entries {
        let key = i.to_le_bytes();
        store.set(&key, &key, Duration::ZERO);
    }
    store.set(b"probe", b"value", Duration::ZERO);
    store
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_get");
    for (name, policy) in POLICIES {
        for entries in SIZES {
            let mut store = populated_store(policy, entries);
            group.bench_with_input(
                BenchmarkId::new(name, entries),
                &entries,
                |b, _| {
                    b.iter(|| black_box(store.get(black_box(b"probe"))));
                },
            );
        }
    }
    group.finish();
}

fn bench_set_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_set_update");
    for (name, policy) in POLICIES {
        for entries in SIZES {
            let mut store = populated_store(policy, entries);
            group.bench_with_input(
                BenchmarkId::new(name, entries),
                &entries,
                |b, _| {
                    b.iter(|| store.set(black_box(b"probe"), black_box(b"value"), Duration::ZERO));
                },
            );
        }
    }
    group.finish();
}

fn bench_set_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_set_insert");
    for (name, policy) in POLICIES {
        group.bench_function(BenchmarkId::new(name, 1_000), |b| {
            b.iter_batched(
                || {
                    let mut store = Store::new();
                    store.set_policy(policy);
                    store
                },
                |mut store| {
                    for i in 0u64..1_000 {
                        let key = i.to_le_bytes();
                        store.set(&key, &key, Duration::ZERO);
                    }
                    store
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_delete_reinsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_delete_reinsert");
    for entries in SIZES {
        let mut store = populated_store(PolicyKind::None, entries);
        group.bench_with_input(BenchmarkId::from_parameter(entries), &entries, |b, _| {
            b.iter(|| {
                store.set(b"probe", b"value", Duration::ZERO);
                store.delete(b"probe");
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_get,
    bench_set_update,
    bench_set_insert,
    bench_delete_reinsert
);
criterion_main!(benches);
