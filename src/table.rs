//! The cache table.
//!
//! A [`CacheTable`] is a fixed array of buckets (67 by default), a global
//! byte counter, and a single reader/writer coordinator guarding the whole
//! table — not one lock per bucket. `lookup` and `contains` take the
//! coordinator in shared mode; the insert append and each eviction removal
//! take it in exclusive mode. Recency stamps written during shared-mode
//! traversals are atomics, so concurrent lookups racing on the same entries
//! stay benign; stamps only steer eviction.
//!
//! Capacity is reconciled at insert time: while the new blob would push the
//! total over the budget, the eviction engine removes one globally
//! least-recently-used entry per round. The eviction scan runs in shared
//! mode and the removal reacquires exclusive mode, so another writer may
//! move the landscape in between; that is fine, because the engine only
//! needs to remove *some* old entry to make progress, and the removal phase
//! reports the length it actually freed.
//!
//! Keys hash with the classic right-to-left multiply-accumulate recurrence
//! (multiplier 37) in wrapping arithmetic; tests pin the exact values since
//! the bucket distribution is observable behavior.

use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::list::Bucket;
use crate::metrics::{CacheCounters, CacheMetrics};
use crate::Blob;

/// Multiplier of the key hash recurrence.
const HASH_NUMBER: u64 = 37;

/// Hashes a key by consuming its bytes right to left with
/// `h = h + 37 * (h + byte)` in wrapping arithmetic.
///
/// # Examples
///
/// ```
/// use webcache_rs::table::hash_code;
///
/// assert_eq!(hash_code("a"), 3589);
/// assert_eq!(hash_code("b"), 3626);
/// ```
pub fn hash_code(key: &str) -> u64 {
    let mut total: u64 = 0;
    for &byte in key.as_bytes().iter().rev() {
        total = total.wrapping_add(HASH_NUMBER.wrapping_mul(total.wrapping_add(u64::from(byte))));
    }
    total
}

/// A thread-safe, byte-budgeted object cache keyed by URL-derived strings.
///
/// Created once before the workers start and shared by reference (typically
/// behind an `Arc`); freed after the last worker is done. Exposes exactly
/// the operations a worker needs: [`lookup`](Self::lookup),
/// [`insert`](Self::insert) and [`contains`](Self::contains).
///
/// # Examples
///
/// ```
/// use webcache_rs::{Blob, CacheTable};
/// use webcache_rs::config::CacheConfig;
///
/// let cache = CacheTable::init(CacheConfig::default());
/// let mut blob = Blob::with_capacity(2);
/// blob.extend_from_slice(b"de");
/// cache.insert("example.org/".to_string(), blob).unwrap();
///
/// assert!(cache.contains("example.org/"));
/// assert_eq!(cache.size(), 2);
/// assert_eq!(cache.lookup("example.org/").unwrap().as_bytes(), b"de");
/// ```
pub struct CacheTable {
    /// The bucket array, guarded as a whole by the coordinator.
    buckets: RwLock<Vec<Bucket>>,
    /// Total bytes held across all buckets. Readable without the lock.
    size: AtomicU64,
    config: CacheConfig,
    counters: CacheCounters,
}

impl CacheTable {
    /// Creates an empty table with `config.buckets` buckets. The table is
    /// never resized.
    pub fn init(config: CacheConfig) -> Self {
        let buckets = (0..config.buckets.get()).map(|_| Bucket::new()).collect();
        CacheTable {
            buckets: RwLock::new(buckets),
            size: AtomicU64::new(0),
            config,
            counters: CacheCounters::default(),
        }
    }

    /// Returns the bucket index a key hashes to.
    #[inline]
    pub fn bucket_index(&self, key: &str) -> usize {
        (hash_code(key) % self.config.buckets.get() as u64) as usize
    }

    /// Returns the total bytes currently held.
    ///
    /// Reads the counter without taking the coordinator; fine for telemetry,
    /// stale by the time you look at it under concurrent writers.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Relaxed)
    }

    /// Returns the configured global byte budget.
    #[inline]
    pub fn max_size(&self) -> u64 {
        self.config.max_cache_size
    }

    /// Returns the per-object ceiling workers consult before inserting.
    #[inline]
    pub fn max_object_size(&self) -> u64 {
        self.config.max_object_size
    }

    /// Returns the number of entries across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.read().iter().map(Bucket::len).sum()
    }

    /// Returns `true` if no entries are cached.
    pub fn is_empty(&self) -> bool {
        self.buckets.read().iter().all(Bucket::is_empty)
    }

    /// Returns `true` if the key's bucket holds the key.
    ///
    /// Shared mode; the traversal refreshes stamps like any lookup. Under
    /// concurrent writers a `true` may be stale before it returns.
    pub fn contains(&self, key: &str) -> bool {
        let idx = self.bucket_index(key);
        let buckets = self.buckets.read();
        buckets[idx].contains(key)
    }

    /// Looks up a key and returns an independent copy of the cached bytes.
    ///
    /// The copy is made while the shared lock is held, which insulates the
    /// caller from an eviction dropping the entry the moment the coordinator
    /// is released. Returns `None` on a miss; misses are not recorded here —
    /// the worker reports them via [`record_miss`](Self::record_miss) once it
    /// knows the object's size.
    pub fn lookup(&self, key: &str) -> Option<Blob> {
        let idx = self.bucket_index(key);
        let buckets = self.buckets.read();
        let entry = buckets[idx].get(key)?;
        let copy = entry.blob.clone();
        self.counters.record_hit(copy.len() as u64);
        Some(copy)
    }

    /// Inserts a blob under a key, taking ownership of both.
    ///
    /// While the new blob would push the total over the budget, one global
    /// LRU entry is evicted per round; the capacity check runs before the
    /// exclusive section and each round acquires the coordinator on its own.
    /// A duplicate key is appended, not replaced — lookups keep returning
    /// the first match from the head of the bucket.
    ///
    /// # Errors
    ///
    /// When the table has been evicted down to empty and the blob alone
    /// still exceeds the budget, the insert is abandoned and `(key, blob)`
    /// are handed back; dropping them is the caller's discard path.
    pub fn insert(&self, key: String, blob: Blob) -> Result<(), (String, Blob)> {
        let new_bytes = blob.len() as u64;
        while self.size.load(Ordering::Relaxed) + new_bytes > self.config.max_cache_size {
            if !self.evict_lru() {
                // Nothing left to evict: the blob alone exceeds the budget.
                return Err((key, blob));
            }
        }

        let idx = self.bucket_index(&key);
        let mut buckets = self.buckets.write();
        buckets[idx].enqueue(CacheEntry::new(key, blob));
        self.size.fetch_add(new_bytes, Ordering::Relaxed);
        self.counters.record_insertion(new_bytes);
        Ok(())
    }

    /// Records a lookup miss; called by the worker once the origin response
    /// size is known.
    pub fn record_miss(&self, object_size: u64) {
        self.counters.record_miss(object_size);
    }

    /// Walks every bucket under the shared lock and sums the blob lengths.
    ///
    /// Intended for tests and debugging; [`size`](Self::size) is the cheap
    /// counter. At quiescence the two agree.
    pub fn stored_bytes(&self) -> u64 {
        let buckets = self.buckets.read();
        buckets
            .iter()
            .flat_map(Bucket::iter)
            .map(CacheEntry::size)
            .sum()
    }

    /// Evicts the globally least recently used entry.
    ///
    /// Scan phase in shared mode: every bucket reports its local LRU and the
    /// smallest stamp wins, earlier buckets winning ties. Removal phase in
    /// exclusive mode: the chosen bucket re-selects its LRU and unlinks it,
    /// so the byte accounting uses what was actually removed even if another
    /// writer changed the bucket between the phases.
    ///
    /// Returns `false` when the scan found every bucket empty.
    fn evict_lru(&self) -> bool {
        let victim_bucket = {
            let buckets = self.buckets.read();
            let mut victim: Option<(usize, u64)> = None;
            for (idx, bucket) in buckets.iter().enumerate() {
                if let Some(entry) = bucket.find_lru() {
                    let stamp = entry.stamp();
                    match victim {
                        Some((_, best)) if best <= stamp => {}
                        _ => victim = Some((idx, stamp)),
                    }
                }
            }
            match victim {
                Some((idx, _)) => idx,
                None => return false,
            }
        };

        let removed = {
            let mut buckets = self.buckets.write();
            let removed = buckets[victim_bucket].remove_lru();
            self.size.fetch_sub(removed, Ordering::Relaxed);
            removed
        };
        if removed > 0 {
            self.counters.record_eviction();
        }
        true
    }
}

impl CacheMetrics for CacheTable {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.counters
            .to_btreemap(self.size(), self.config.max_cache_size)
    }

    fn algorithm_name(&self) -> &'static str {
        "LRU"
    }
}

impl core::fmt::Debug for CacheTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CacheTable")
            .field("buckets", &self.config.buckets)
            .field("size", &self.size())
            .field("max_size", &self.config.max_cache_size)
            .finish()
    }
}
