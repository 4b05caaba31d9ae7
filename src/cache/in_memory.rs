//! InMemoryCacheStore - HashMap-backed cache for tests and single-process use.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use super::hyperloglog::{DistinctCounter, HyperLogLog};
use super::sorted_set::SortedSet;
use super::{CacheError, CacheStore, HllUpdate};

#[derive(Debug, Clone)]
enum Value {
    Bytes(Vec<u8>),
    List(Vec<String>),
    HyperLogLog(Box<HyperLogLog>),
    SortedSet(SortedSet),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-memory cache store.
///
/// Every operation runs under a single lock, so each one is atomic in the
/// same way a single command against a networked cache is. Expired keys are
/// invisible to readers and dropped lazily by the next write to them.
///
/// Clone-friendly via Arc: clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    slots: Arc<RwLock<HashMap<String, Slot>>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining time to live of a key. `None` when the key is absent or has
    /// no expiry.
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let now = Instant::now();
        let slots = self.read("ttl")?;
        Ok(slots
            .get(key)
            .filter(|slot| slot.is_live(now))
            .and_then(|slot| slot.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    /// Number of live keys.
    pub fn len(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        Ok(self
            .read("len")?
            .values()
            .filter(|slot| slot.is_live(now))
            .count())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Drop every key.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.write("clear")?.clear();
        Ok(())
    }

    fn read(
        &self,
        operation: &'static str,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Slot>>, CacheError> {
        self.slots
            .read()
            .map_err(|_| CacheError::LockPoisoned(operation))
    }

    fn write(
        &self,
        operation: &'static str,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Slot>>, CacheError> {
        self.slots
            .write()
            .map_err(|_| CacheError::LockPoisoned(operation))
    }

    // Read a live slot's value, or `None` when absent/expired.
    fn with_live<T>(
        &self,
        operation: &'static str,
        key: &str,
        f: impl FnOnce(&Value) -> Result<T, CacheError>,
    ) -> Result<Option<T>, CacheError> {
        let now = Instant::now();
        let slots = self.read(operation)?;
        match slots.get(key) {
            Some(slot) if slot.is_live(now) => f(&slot.value).map(Some),
            _ => Ok(None),
        }
    }

    // Get the live slot for `key` for mutation, creating it with `init` when
    // absent or expired.
    fn upsert<T>(
        &self,
        operation: &'static str,
        key: &str,
        init: impl FnOnce() -> Value,
        f: impl FnOnce(&mut Value) -> Result<T, CacheError>,
    ) -> Result<T, CacheError> {
        let now = Instant::now();
        let mut slots = self.write(operation)?;
        if slots.get(key).map_or(false, |slot| !slot.is_live(now)) {
            slots.remove(key);
        }
        let slot = slots
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(init(), None));
        f(&mut slot.value)
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.with_live("get", key, |value| match value {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            _ => Err(CacheError::wrong_type(key, "string")),
        })
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.write("set")?
            .insert(key.to_string(), Slot::new(Value::Bytes(value), ttl));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        Ok(self
            .write("delete")?
            .remove(key)
            .map_or(false, |slot| slot.is_live(now)))
    }

    fn list_replace(
        &self,
        key: &str,
        values: &[String],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut slots = self.write("list_replace")?;
        if values.is_empty() {
            // An empty list does not exist.
            slots.remove(key);
        } else {
            slots.insert(
                key.to_string(),
                Slot::new(Value::List(values.to_vec()), ttl),
            );
        }
        Ok(())
    }

    fn list_range(&self, key: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .with_live("list_range", key, |value| match value {
                Value::List(items) => Ok(items.clone()),
                _ => Err(CacheError::wrong_type(key, "list")),
            })?
            .unwrap_or_default())
    }

    fn hll_add_delta(&self, key: &str, member: &str) -> Result<HllUpdate, CacheError> {
        self.upsert(
            "hll_add",
            key,
            || Value::HyperLogLog(Box::default()),
            |value| match value {
                Value::HyperLogLog(hll) => {
                    let before = hll.count();
                    let changed = hll.add(member.as_bytes());
                    let delta = if changed {
                        hll.count() as i64 - before as i64
                    } else {
                        0
                    };
                    Ok(HllUpdate { changed, delta })
                }
                _ => Err(CacheError::wrong_type(key, "hyperloglog")),
            },
        )
    }

    fn hll_count(&self, key: &str) -> Result<u64, CacheError> {
        Ok(self
            .with_live("hll_count", key, |value| match value {
                Value::HyperLogLog(hll) => Ok(hll.count()),
                _ => Err(CacheError::wrong_type(key, "hyperloglog")),
            })?
            .unwrap_or(0))
    }

    fn zincr_by(&self, key: &str, member: &str, delta: i64) -> Result<i64, CacheError> {
        self.upsert(
            "zincr_by",
            key,
            || Value::SortedSet(SortedSet::default()),
            |value| match value {
                Value::SortedSet(set) => Ok(set.incr_by(member, delta)),
                _ => Err(CacheError::wrong_type(key, "sorted set")),
            },
        )
    }

    fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, CacheError> {
        Ok(self
            .with_live("zscore", key, |value| match value {
                Value::SortedSet(set) => Ok(set.score(member)),
                _ => Err(CacheError::wrong_type(key, "sorted set")),
            })?
            .flatten())
    }

    fn zrev_range(&self, key: &str, limit: usize) -> Result<Vec<(String, i64)>, CacheError> {
        Ok(self
            .with_live("zrev_range", key, |value| match value {
                Value::SortedSet(set) => Ok(set.top(limit)),
                _ => Err(CacheError::wrong_type(key, "sorted set")),
            })?
            .unwrap_or_default())
    }
}
