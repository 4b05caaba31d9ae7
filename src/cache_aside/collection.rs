//! The cached collections and how each one maps onto cache keys.

use std::time::Duration;

use crate::cache::{keys, CacheError, CacheStore};
use crate::catalog::{Book, CatalogStore, StoreError};

/// A list derived from the catalog that can be kept in the cache.
pub trait CachedCollection: Send + Sync + 'static {
    type Item: Clone + Send + 'static;

    /// Name used in log lines.
    fn name(&self) -> &'static str;

    /// Current cached contents. `None` when the key is absent or expired.
    fn read(&self, cache: &dyn CacheStore) -> Result<Option<Vec<Self::Item>>, CacheError>;

    /// Replace the cached contents.
    fn write(
        &self,
        cache: &dyn CacheStore,
        items: &[Self::Item],
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Authoritative contents.
    fn load(&self, store: &dyn CatalogStore) -> Result<Vec<Self::Item>, StoreError>;
}

/// Distinct categories, kept as a cache list under `categories`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoriesCollection;

impl CachedCollection for CategoriesCollection {
    type Item = String;

    fn name(&self) -> &'static str {
        "categories"
    }

    fn read(&self, cache: &dyn CacheStore) -> Result<Option<Vec<String>>, CacheError> {
        let items = cache.list_range(keys::CATEGORIES)?;
        Ok(Some(items).filter(|items| !items.is_empty()))
    }

    fn write(
        &self,
        cache: &dyn CacheStore,
        items: &[String],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        cache.list_replace(keys::CATEGORIES, items, Some(ttl))
    }

    fn load(&self, store: &dyn CatalogStore) -> Result<Vec<String>, StoreError> {
        store.categories()
    }
}

/// The most recently added books, stored as one encoded snapshot under
/// `books:new`.
#[derive(Debug, Clone, Copy)]
pub struct NewBooksCollection {
    limit: usize,
}

impl NewBooksCollection {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl CachedCollection for NewBooksCollection {
    type Item = Book;

    fn name(&self) -> &'static str {
        "new-books"
    }

    fn read(&self, cache: &dyn CacheStore) -> Result<Option<Vec<Book>>, CacheError> {
        match cache.get(keys::NEW_BOOKS)? {
            Some(bytes) => Ok(Some(bitcode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(
        &self,
        cache: &dyn CacheStore,
        items: &[Book],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let bytes = bitcode::serialize(items)?;
        cache.set(keys::NEW_BOOKS, bytes, Some(ttl))
    }

    fn load(&self, store: &dyn CatalogStore) -> Result<Vec<Book>, StoreError> {
        store.new_books(self.limit)
    }
}
