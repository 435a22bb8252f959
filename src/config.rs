//! Cache configuration.
//!
//! A [`CacheConfig`] fixes the table geometry and the byte budgets at
//! construction time; the table is never resized afterwards. The defaults
//! are the constants the proxy has always shipped with.

use core::fmt;
use core::num::NonZeroUsize;

/// Number of buckets in the cache table.
pub const BUCKET_COUNT: usize = 67;

/// Maximum total bytes held across all buckets.
pub const MAX_CACHE_SIZE: u64 = 1_048_756;

/// Per-object ceiling enforced by the worker: responses at least this large
/// are streamed to the client but never inserted.
pub const MAX_OBJECT_SIZE: u64 = 102_400;

/// Configuration for a [`CacheTable`](crate::CacheTable).
///
/// # Examples
///
/// ```
/// use webcache_rs::config::CacheConfig;
///
/// let config = CacheConfig::default();
/// assert_eq!(config.buckets.get(), 67);
/// assert_eq!(config.max_cache_size, 1_048_756);
/// ```
#[derive(Clone, Copy)]
pub struct CacheConfig {
    /// Number of buckets. Fixed for the table's lifetime.
    pub buckets: NonZeroUsize,
    /// Global byte budget across all buckets.
    pub max_cache_size: u64,
    /// Per-object ceiling consulted by workers before inserting.
    pub max_object_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            buckets: NonZeroUsize::new(BUCKET_COUNT).unwrap(),
            max_cache_size: MAX_CACHE_SIZE,
            max_object_size: MAX_OBJECT_SIZE,
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("buckets", &self.buckets)
            .field("max_cache_size", &self.max_cache_size)
            .field("max_object_size", &self.max_object_size)
            .finish()
    }
}
