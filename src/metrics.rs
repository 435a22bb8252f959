//! Cache metrics.
//!
//! Counter snapshots are reported as a `BTreeMap` so the keys always come
//! out in the same order; that determinism matters for comparing runs and
//! for stable log lines, and the O(log n) cost is irrelevant at ~15 keys.
//!
//! The counters themselves are relaxed atomics: hits are recorded under the
//! table's *shared* lock and misses are recorded by workers with no lock at
//! all, so `&mut self` accounting is not an option here. The cache records
//! hits, insertions and evictions on its own; misses are the worker's to
//! report, since only the worker learns the fetched object's size.

use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeMap;

/// Uniform metrics reporting interface.
///
/// Returns every metric as a key-value pair in deterministic (alphabetical)
/// order, plus a short identifier for the eviction policy in use.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Policy name for identification (e.g. "LRU").
    fn algorithm_name(&self) -> &'static str;
}

/// Shared request/byte/eviction counters for the cache table.
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    /// Total lookups observed (hits plus reported misses).
    requests: AtomicU64,
    /// Lookups that were served from the cache.
    cache_hits: AtomicU64,
    /// Bytes requested across hits and reported misses.
    total_bytes_requested: AtomicU64,
    /// Bytes served directly from the cache.
    bytes_served_from_cache: AtomicU64,
    /// Bytes written into the cache by inserts.
    bytes_written_to_cache: AtomicU64,
    /// Entries removed to make room.
    evictions: AtomicU64,
}

impl CacheCounters {
    /// Records a lookup that found its key.
    pub(crate) fn record_hit(&self, object_size: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.total_bytes_requested
            .fetch_add(object_size, Ordering::Relaxed);
        self.bytes_served_from_cache
            .fetch_add(object_size, Ordering::Relaxed);
    }

    /// Records a lookup that missed; the worker calls this once it knows the
    /// fetched object's size.
    pub(crate) fn record_miss(&self, object_size: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.total_bytes_requested
            .fetch_add(object_size, Ordering::Relaxed);
    }

    /// Records a completed insert.
    pub(crate) fn record_insertion(&self, object_size: u64) {
        self.bytes_written_to_cache
            .fetch_add(object_size, Ordering::Relaxed);
    }

    /// Records one eviction.
    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshots every counter plus the live size handed in by the table.
    pub(crate) fn to_btreemap(
        &self,
        cache_size_bytes: u64,
        max_cache_size_bytes: u64,
    ) -> BTreeMap<String, f64> {
        let requests = self.requests.load(Ordering::Relaxed);
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let total_bytes_requested = self.total_bytes_requested.load(Ordering::Relaxed);
        let bytes_served_from_cache = self.bytes_served_from_cache.load(Ordering::Relaxed);
        let bytes_written_to_cache = self.bytes_written_to_cache.load(Ordering::Relaxed);
        let evictions = self.evictions.load(Ordering::Relaxed);

        let rate = |part: u64, whole: u64| {
            if whole > 0 {
                part as f64 / whole as f64
            } else {
                0.0
            }
        };

        let mut metrics = BTreeMap::new();
        metrics.insert("cache_hits".to_string(), cache_hits as f64);
        metrics.insert(
            "cache_misses".to_string(),
            requests.saturating_sub(cache_hits) as f64,
        );
        metrics.insert("evictions".to_string(), evictions as f64);
        metrics.insert("requests".to_string(), requests as f64);

        metrics.insert("hit_rate".to_string(), rate(cache_hits, requests));
        metrics.insert(
            "miss_rate".to_string(),
            rate(requests.saturating_sub(cache_hits), requests),
        );
        metrics.insert(
            "byte_hit_rate".to_string(),
            rate(bytes_served_from_cache, total_bytes_requested),
        );

        metrics.insert(
            "bytes_served_from_cache".to_string(),
            bytes_served_from_cache as f64,
        );
        metrics.insert(
            "bytes_written_to_cache".to_string(),
            bytes_written_to_cache as f64,
        );
        metrics.insert(
            "total_bytes_requested".to_string(),
            total_bytes_requested as f64,
        );

        metrics.insert("cache_size_bytes".to_string(), cache_size_bytes as f64);
        metrics.insert(
            "max_cache_size_bytes".to_string(),
            max_cache_size_bytes as f64,
        );
        metrics.insert(
            "cache_utilization".to_string(),
            rate(cache_size_bytes, max_cache_size_bytes),
        );

        if requests > 0 {
            metrics.insert(
                "avg_object_size".to_string(),
                total_bytes_requested as f64 / requests as f64,
            );
            metrics.insert(
                "eviction_rate".to_string(),
                evictions as f64 / requests as f64,
            );
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = CacheCounters::default();
        let snapshot = counters.to_btreemap(0, 1_000);
        assert_eq!(snapshot["requests"], 0.0);
        assert_eq!(snapshot["cache_hits"], 0.0);
        assert_eq!(snapshot["cache_misses"], 0.0);
        assert_eq!(snapshot["hit_rate"], 0.0);
    }

    #[test]
    fn test_hit_and_miss_accounting() {
        let counters = CacheCounters::default();
        counters.record_hit(100);
        counters.record_hit(50);
        counters.record_miss(200);

        let snapshot = counters.to_btreemap(150, 1_000);
        assert_eq!(snapshot["requests"], 3.0);
        assert_eq!(snapshot["cache_hits"], 2.0);
        assert_eq!(snapshot["cache_misses"], 1.0);
        assert_eq!(snapshot["bytes_served_from_cache"], 150.0);
        assert_eq!(snapshot["total_bytes_requested"], 350.0);
        assert!((snapshot["hit_rate"] - 2.0 / 3.0).abs() < 1e-9);
        assert!((snapshot["cache_utilization"] - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_eviction_and_insertion_counters() {
        let counters = CacheCounters::default();
        counters.record_insertion(64);
        counters.record_eviction();
        let snapshot = counters.to_btreemap(0, 1_000);
        assert_eq!(snapshot["bytes_written_to_cache"], 64.0);
        assert_eq!(snapshot["evictions"], 1.0);
    }
}
