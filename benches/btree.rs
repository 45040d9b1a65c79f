//! B+tree map benchmarks.
//!
//! Measures the map operations the concurrent-map workbench exercises:
//! bulk inserts in several key orders, lower-bound probes, and the
//! lower-bound/erase/insert churn round, each against the standard
//! library's `BTreeMap` as the baseline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memtree::BtreeMap;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap as StdMap;

fn keys_shuffled(count: usize, seed: u64) -> Vec<u32> {
    let mut keys: Vec<u32> = (0..count as u32).collect();
    keys.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    keys
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for &count in &[1_000usize, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("sequential", count), &count, |b, &count| {
            b.iter(|| {
                let mut map: BtreeMap<u32, u32> = BtreeMap::new();
                for key in 0..count as u32 {
                    map.insert(key, key);
                }
                black_box(map.size())
            });
        });

        group.bench_with_input(BenchmarkId::new("reverse", count), &count, |b, &count| {
            b.iter(|| {
                let mut map: BtreeMap<u32, u32> = BtreeMap::new();
                for key in (0..count as u32).rev() {
                    map.insert(key, key);
                }
                black_box(map.size())
            });
        });

        let keys = keys_shuffled(count, 7);
        group.bench_with_input(BenchmarkId::new("random", count), &keys, |b, keys| {
            b.iter(|| {
                let mut map: BtreeMap<u32, u32> = BtreeMap::new();
                for &key in keys {
                    map.insert(key, key);
                }
                black_box(map.size())
            });
        });

        let keys = keys_shuffled(count, 7);
        group.bench_with_input(BenchmarkId::new("std_random", count), &keys, |b, keys| {
            b.iter(|| {
                let mut map: StdMap<u32, u32> = StdMap::new();
                for &key in keys {
                    map.insert(key, key);
                }
                black_box(map.len())
            });
        });
    }

    group.finish();
}

fn bench_lower_bound(c: &mut Criterion) {
    let mut group = c.benchmark_group("lower_bound");
    const COUNT: u32 = 100_000;

    let mut map: BtreeMap<u32, u32> = BtreeMap::new();
    let mut std_map: StdMap<u32, u32> = StdMap::new();
    for key in 0..COUNT {
        map.insert(key * 2, key);
        std_map.insert(key * 2, key);
    }
    let probes: Vec<u32> = {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        (0..1024).map(|_| rng.gen_range(0..COUNT * 2)).collect()
    };

    group.throughput(Throughput::Elements(probes.len() as u64));
    group.bench_function("memtree", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for &probe in &probes {
                if map.lower_bound(&probe).key().is_some() {
                    hits += 1;
                }
            }
            black_box(hits)
        });
    });
    group.bench_function("std", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for &probe in &probes {
                if std_map.range(probe..).next().is_some() {
                    hits += 1;
                }
            }
            black_box(hits)
        });
    });

    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    const KEY_SPACE: u32 = 1 << 16;
    const INITIAL: usize = 10_000;
    const ROUNDS: usize = 1_000;

    group.throughput(Throughput::Elements(ROUNDS as u64));
    group.bench_function("lower_bound_erase_insert", |b| {
        b.iter_with_setup(
            || {
                let mut rng = ChaCha8Rng::seed_from_u64(3);
                let mut map: BtreeMap<u32, u32> = BtreeMap::new();
                for _ in 0..INITIAL {
                    map.insert(rng.gen_range(0..KEY_SPACE), 0);
                }
                (map, rng)
            },
            |(mut map, mut rng)| {
                for _ in 0..ROUNDS {
                    let probe = rng.gen_range(0..KEY_SPACE);
                    let it = map.lower_bound(&probe);
                    if it.key().is_some() {
                        let pos = it.pos();
                        map.erase_at(pos);
                        map.insert(rng.gen_range(0..KEY_SPACE), 0);
                    }
                }
                black_box(map.size())
            },
        );
    });

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    const COUNT: u32 = 100_000;

    let mut map: BtreeMap<u32, u32> = BtreeMap::new();
    for key in 0..COUNT {
        map.insert(key, key);
    }

    group.throughput(Throughput::Elements(COUNT as u64));
    group.bench_function("in_order", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for (_, value) in map.iter() {
                sum += value as u64;
            }
            black_box(sum)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_lower_bound, bench_churn, bench_scan);
criterion_main!(benches);
