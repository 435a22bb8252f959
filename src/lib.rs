#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CacheTable`] | The shared cache: 67 buckets, one coordinator, a byte budget |
//! | [`Blob`] | Growable, length-tracked byte buffer — the cached value |
//! | [`CacheEntry`] | One cached object: owned key, owned blob, recency stamp |
//! | [`CacheConfig`] | Table geometry and byte budgets |
//! | [`CacheMetrics`] | Deterministic counter snapshots |
//!
//! The worker-facing surface is exactly three operations plus the miss
//! report:
//!
//! ```
//! use webcache_rs::{Blob, CacheTable};
//! use webcache_rs::config::CacheConfig;
//! use webcache_rs::key::cache_key;
//!
//! let cache = CacheTable::init(CacheConfig::default());
//! let key = cache_key("example.org", "/logo.png");
//!
//! if cache.lookup(&key).is_none() {
//!     // ... fetch from the origin, stream to the client ...
//!     let mut body = Blob::with_capacity(8192);
//!     body.extend_from_slice(b"\x89PNG...");
//!     cache.record_miss(body.len() as u64);
//!     if (body.len() as u64) < cache.max_object_size() {
//!         let _ = cache.insert(key, body);
//!     }
//! }
//! ```
//!
//! ## Concurrency model
//!
//! One reader/writer lock guards the whole table. `lookup` and `contains`
//! take it shared; the insert append and each eviction removal take it
//! exclusive. The eviction scan across buckets runs in shared mode and the
//! removal phase revalidates inside the chosen bucket, so accounting stays
//! consistent even when writers interleave. Recency stamps are relaxed
//! atomics, making the stamp races inherent to shared-mode traversal benign
//! by construction.

/// Growable, length-tracked byte container.
///
/// The unit of value stored in the cache. Mutable while a response body is
/// accumulated, treated as immutable once inserted.
pub mod blob;

/// Cache entry type and the process-wide recency clock.
pub mod entry;

/// Doubly linked bucket list with sentinel nodes.
///
/// Internal infrastructure: raw pointer surgery lives here, behind the
/// table's coordinator. Not part of the public API.
pub(crate) mod list;

/// Table geometry and byte budget configuration.
pub mod config;

/// Worker-side cache key derivation (`host ∥ path`).
pub mod key;

/// Deterministic metrics snapshots over shared atomic counters.
pub mod metrics;

/// The bucketed cache table and its eviction engine.
pub mod table;

pub use blob::Blob;
pub use config::CacheConfig;
pub use entry::CacheEntry;
pub use metrics::CacheMetrics;
pub use table::CacheTable;
