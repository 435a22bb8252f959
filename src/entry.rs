//! Cache entry type and the recency clock.
//!
//! Each bucket node holds a [`CacheEntry`]: the owned key, the owned blob,
//! and a recency stamp. Stamps come from a process-wide monotonic counter;
//! a smaller stamp means older. The stamp is an atomic because it is
//! refreshed during lookup traversals that run under the table's *shared*
//! lock — concurrent lookups may race on stamping the same entry, and the
//! atomic makes that race benign by construction. Stamps only steer
//! eviction; the link structure is never touched under the shared lock.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Process-wide recency clock. Starts at 1 so a fresh, never-enqueued entry
/// (stamp 0) always reads as oldest.
static RECENCY_CLOCK: AtomicU64 = AtomicU64::new(1);

/// Returns the next recency stamp. Strictly increasing within a process.
#[inline]
pub(crate) fn next_stamp() -> u64 {
    RECENCY_CLOCK.fetch_add(1, Ordering::Relaxed)
}

/// One cached object: an owned key, an owned blob, and a recency stamp.
///
/// The cache takes ownership of both the key and the blob on insert; the
/// entry's size is defined as the blob's length.
pub struct CacheEntry {
    /// The cache key, owned by the entry.
    pub key: String,
    /// The cached bytes, owned by the entry.
    pub blob: crate::Blob,
    /// Last-touched recency stamp.
    stamp: AtomicU64,
}

impl CacheEntry {
    /// Creates an entry that has never been touched (stamp 0). The bucket
    /// stamps it when it is linked in.
    pub fn new(key: String, blob: crate::Blob) -> Self {
        CacheEntry {
            key,
            blob,
            stamp: AtomicU64::new(0),
        }
    }

    /// Refreshes the recency stamp to "now".
    ///
    /// Takes `&self`: touching happens during traversals under the shared
    /// lock.
    #[inline]
    pub fn touch(&self) {
        self.stamp.store(next_stamp(), Ordering::Relaxed);
    }

    /// Returns the current recency stamp.
    #[inline]
    pub fn stamp(&self) -> u64 {
        self.stamp.load(Ordering::Relaxed)
    }

    /// Returns the entry's size in bytes: the blob length.
    #[inline]
    pub fn size(&self) -> u64 {
        self.blob.len() as u64
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("size", &self.size())
            .field("stamp", &self.stamp())
            .finish()
    }
}
