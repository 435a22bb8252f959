use std::num::NonZeroUsize;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use webcache_rs::config::CacheConfig;
use webcache_rs::{Blob, CacheTable};

fn blob(size: usize) -> Blob {
    let mut b = Blob::with_capacity(size);
    b.extend_from_slice(&vec![b'x'; size]);
    b
}

fn make_cache(max_cache_size: u64) -> CacheTable {
    CacheTable::init(CacheConfig {
        buckets: NonZeroUsize::new(67).unwrap(),
        max_cache_size,
        max_object_size: 102_400,
    })
}

pub fn criterion_benchmark(c: &mut Criterion) {
    const KEY_COUNT: usize = 1_000;
    let mut group = c.benchmark_group("Cache Operations");

    // Lookup benchmarks against a pre-filled table
    {
        let cache = make_cache(u64::MAX);
        for i in 0..KEY_COUNT {
            cache.insert(format!("host{}/path", i), blob(64)).unwrap();
        }

        group.bench_function("lookup hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.lookup(&format!("host{}/path", i % KEY_COUNT)));
                }
            });
        });

        group.bench_function("lookup miss", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.lookup(&format!("host{}/path", i + KEY_COUNT)));
                }
            });
        });

        group.bench_function("contains", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.contains(&format!("host{}/path", i % KEY_COUNT)));
                }
            });
        });
    }

    // Insert without eviction pressure
    {
        let cache = make_cache(u64::MAX);
        let mut n = 0usize;
        group.bench_function("insert unbounded", |b| {
            b.iter(|| {
                cache
                    .insert(format!("fresh{}/path", n), black_box(blob(64)))
                    .unwrap();
                n += 1;
            });
        });
    }

    // Insert with the budget saturated, so every round pays for a global
    // LRU scan plus an eviction
    {
        let cache = make_cache(64 * 128);
        let mut n = 0usize;
        group.bench_function("insert under eviction pressure", |b| {
            b.iter(|| {
                cache
                    .insert(format!("churn{}/path", n), black_box(blob(64)))
                    .unwrap();
                n += 1;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
