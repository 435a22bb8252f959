//! Concurrent correctness tests for the cache table.
//!
//! ## Test Strategy
//!
//! These tests validate the coordinator discipline rather than throughput:
//! - concurrent lookups of distinct keys must match some serial schedule
//! - accounting must be exact once the threads quiesce
//! - a reconciliation insert after a storm must land the table back under
//!   its byte budget
//!
//! Writer races are allowed to overshoot the budget transiently (the
//! capacity check runs before the exclusive section); only quiescent states
//! are asserted against the budget.

use std::sync::Arc;
use std::thread;

use scoped_threadpool::Pool;
use webcache_rs::config::CacheConfig;
use webcache_rs::{Blob, CacheTable};

fn blob(bytes: &[u8]) -> Blob {
    let mut b = Blob::with_capacity(bytes.len());
    b.extend_from_slice(bytes);
    b
}

fn make_cache(max_cache_size: u64) -> CacheTable {
    CacheTable::init(CacheConfig {
        max_cache_size,
        ..CacheConfig::default()
    })
}

#[test]
fn test_concurrent_inserts_distinct_keys_account_exactly() {
    // Budget far above the working set, so no evictions interfere and the
    // final byte count is exact.
    let cache = Arc::new(make_cache(10_000_000));
    let num_threads = 8;
    let ops_per_thread = 100;

    let mut handles: Vec<thread::JoinHandle<()>> = Vec::new();
    for t in 0..num_threads {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..ops_per_thread {
                let key = format!("thread_{}_key_{}", t, i);
                cache.insert(key, blob(b"abc")).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.size(), (num_threads * ops_per_thread * 3) as u64);
    assert_eq!(cache.size(), cache.stored_bytes());
    assert_eq!(cache.len(), num_threads * ops_per_thread);
}

#[test]
fn test_concurrent_lookups_of_distinct_keys() {
    let cache = Arc::new(make_cache(10_000_000));
    for t in 0..8 {
        for i in 0..50 {
            cache
                .insert(format!("t{}_k{}", t, i), blob(format!("value_{}_{}", t, i).as_bytes()))
                .unwrap();
        }
    }

    let mut handles: Vec<thread::JoinHandle<()>> = Vec::new();
    for t in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                let key = format!("t{}_k{}", t, i);
                let copy = cache.lookup(&key).unwrap();
                assert_eq!(copy.as_bytes(), format!("value_{}_{}", t, i).as_bytes());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_contains_agrees_with_lookup_without_writers() {
    let cache = Arc::new(make_cache(10_000_000));
    for i in 0..100 {
        cache.insert(format!("k{i}"), blob(b"v")).unwrap();
    }

    let mut handles: Vec<thread::JoinHandle<()>> = Vec::new();
    for _ in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                let key = format!("k{i}");
                assert_eq!(cache.contains(&key), cache.lookup(&key).is_some());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_mixed_storm_quiesces_consistently() {
    let cache = Arc::new(make_cache(1_000));
    let num_threads = 8;
    let ops_per_thread = 500;

    let mut handles: Vec<thread::JoinHandle<()>> = Vec::new();
    for t in 0..num_threads {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..ops_per_thread {
                let key = format!("key_{}", i % 40);
                match (t + i) % 3 {
                    0 => {
                        let size = i % 23 + 1;
                        let _ = cache.insert(key, blob(&vec![b'x'; size]));
                    }
                    1 => {
                        let _ = cache.lookup(&key);
                    }
                    _ => {
                        let _ = cache.contains(&key);
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // The counter and a full walk must agree once everything quiesces.
    assert_eq!(cache.size(), cache.stored_bytes());

    // One reconciling insert pulls the table back under its budget no
    // matter how the writers interleaved.
    cache.insert("final".to_string(), blob(b"z")).unwrap();
    assert!(cache.size() <= 1_000);
    assert_eq!(cache.size(), cache.stored_bytes());
}

#[test]
fn test_scoped_pool_insert_and_lookup() {
    let cache = make_cache(10_000_000);

    let mut pool = Pool::new(4);
    pool.scoped(|scope| {
        for t in 0..4 {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..100 {
                    let key = format!("pool_{}_{}", t, i);
                    cache.insert(key.clone(), blob(b"pooled")).unwrap();
                    assert_eq!(cache.lookup(&key).unwrap().as_bytes(), b"pooled");
                }
            });
        }
    });

    assert_eq!(cache.len(), 400);
    assert_eq!(cache.size(), cache.stored_bytes());
}

#[test]
fn test_eviction_under_concurrent_pressure_makes_progress() {
    // Tight budget with every thread inserting oversubscribed payloads;
    // the run must terminate and leave consistent accounting.
    let cache = Arc::new(make_cache(256));
    let mut handles: Vec<thread::JoinHandle<()>> = Vec::new();
    for t in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                let key = format!("p{}_{}", t, i % 10);
                cache.insert(key, blob(&[b'y'; 32])).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.size(), cache.stored_bytes());
    cache.insert("settle".to_string(), blob(b"s")).unwrap();
    assert!(cache.size() <= 256);
}
