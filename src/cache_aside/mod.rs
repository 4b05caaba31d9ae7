//! Cache-aside reads for the catalog's derived collections.
//!
//! [`CacheAside`] wraps one [`CachedCollection`] and a [`BackgroundTasks`]
//! pool. Reads never fail because of the cache; only the fallback store
//! read can return an error.

mod background;
mod collection;
mod reader;

pub use background::BackgroundTasks;
pub use collection::{CachedCollection, CategoriesCollection, NewBooksCollection};
pub use reader::{CacheAside, Fetched};

pub type CategoriesCache = CacheAside<CategoriesCollection>;
pub type NewBooksCache = CacheAside<NewBooksCollection>;
