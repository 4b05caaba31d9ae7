use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{BackgroundTasks, CachedCollection};
use crate::cache::CacheStore;
use crate::catalog::{CatalogStore, StoreError};

/// Result of a cache-aside read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    pub items: Vec<T>,
    /// True when served from the cache without touching the store.
    pub from_cache: bool,
}

/// Read-through access to one [`CachedCollection`].
///
/// A non-empty cached value is returned as is. Anything else (missing key,
/// empty value, or a cache that errors) falls back to the catalog store,
/// and the freshly loaded items are written back on the background pool
/// with the configured TTL. Cache problems are logged, never returned.
pub struct CacheAside<C> {
    collection: Arc<C>,
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
    background: Arc<BackgroundTasks>,
}

impl<C: CachedCollection> CacheAside<C> {
    pub fn new(
        collection: C,
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheStore>,
        ttl: Duration,
        background: Arc<BackgroundTasks>,
    ) -> Self {
        Self {
            collection: Arc::new(collection),
            store,
            cache,
            ttl,
            background,
        }
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self) -> Result<Fetched<C::Item>, StoreError> {
        let name = self.collection.name();

        match self.collection.read(self.cache.as_ref()) {
            Ok(Some(items)) if !items.is_empty() => {
                debug!(collection = name, items = items.len(), "cache hit");
                return Ok(Fetched {
                    items,
                    from_cache: true,
                });
            }
            Ok(_) => debug!(collection = name, "cache miss"),
            Err(err) => warn!(collection = name, error = %err, "cache read failed, using store"),
        }

        let items = self.collection.load(self.store.as_ref())?;
        if !items.is_empty() {
            self.repopulate(items.clone());
        }

        Ok(Fetched {
            items,
            from_cache: false,
        })
    }

    fn repopulate(&self, items: Vec<C::Item>) {
        let collection = Arc::clone(&self.collection);
        let cache = Arc::clone(&self.cache);
        let ttl = self.ttl;
        let name = collection.name();

        let submitted = self.background.submit(name, move || {
            if let Err(err) = collection.write(cache.as_ref(), &items, ttl) {
                warn!(collection = collection.name(), error = %err, "cache repopulation failed");
                return Err(err.into());
            }
            debug!(collection = collection.name(), items = items.len(), "cache repopulated");
            Ok(())
        });

        if let Err(err) = submitted {
            warn!(collection = name, error = %err, "cache repopulation dropped");
        }
    }
}
