//! Cache store - the primitive layer under the read-side components.
//!
//! The trait mirrors the handful of commands a networked key-value cache
//! offers: plain values with TTL, lists, HyperLogLog distinct counters and
//! sorted sets. Each method is one atomic operation on the backend; callers
//! never read-modify-write across two calls.
//!
//! ## Example
//!
//! ```
//! use library_catalog::cache::{CacheStore, InMemoryCacheStore};
//!
//! let cache = InMemoryCacheStore::new();
//! assert!(cache.hll_add("books:1:views", "user-7").unwrap());
//! assert!(!cache.hll_add("books:1:views", "user-7").unwrap());
//! assert_eq!(cache.hll_count("books:1:views").unwrap(), 1);
//! ```

mod error;
mod hyperloglog;
mod in_memory;
pub mod keys;
mod sorted_set;

use std::time::Duration;

pub use error::CacheError;
pub use hyperloglog::{DistinctCounter, HyperLogLog};
pub use in_memory::InMemoryCacheStore;

/// Outcome of [`CacheStore::hll_add_delta`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HllUpdate {
    /// A register grew.
    pub changed: bool,
    /// Estimate after the add minus the estimate before it. Summed over
    /// every add of a key this equals the key's current count.
    pub delta: i64,
}

/// Handle to a shared cache backend.
///
/// Created once at startup and passed by reference (usually as
/// `Arc<dyn CacheStore>`) to every component that needs it.
pub trait CacheStore: Send + Sync {
    /// Read a plain value. `None` when absent or expired.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Write a plain value, replacing whatever the key held.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Remove a key of any type. Returns true if it existed.
    fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Atomically replace a list's contents and its TTL. An empty `values`
    /// removes the key.
    fn list_replace(
        &self,
        key: &str,
        values: &[String],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;

    /// Full contents of a list. Empty when absent.
    fn list_range(&self, key: &str) -> Result<Vec<String>, CacheError>;

    /// Add a member to a HyperLogLog, creating it if needed. Returns true
    /// when a register grew, i.e. the member is (probably) new.
    fn hll_add(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        Ok(self.hll_add_delta(key, member)?.changed)
    }

    /// `hll_add` that also reports how far the estimate moved, read before
    /// and after the add in the same atomic step.
    fn hll_add_delta(&self, key: &str, member: &str) -> Result<HllUpdate, CacheError>;

    /// Estimated distinct members of a HyperLogLog. 0 when absent.
    fn hll_count(&self, key: &str) -> Result<u64, CacheError>;

    /// Atomically add `delta` to a member's score, creating the set and the
    /// member as needed. Returns the new score.
    fn zincr_by(&self, key: &str, member: &str, delta: i64) -> Result<i64, CacheError>;

    fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, CacheError>;

    /// Up to `limit` members, highest score first.
    fn zrev_range(&self, key: &str, limit: usize) -> Result<Vec<(String, i64)>, CacheError>;
}
