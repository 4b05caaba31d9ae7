//! Catalog service - the entry point request handlers talk to.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use library_catalog::bus::InMemoryLog;
//! use library_catalog::cache::InMemoryCacheStore;
//! use library_catalog::cache_aside::BackgroundTasks;
//! use library_catalog::catalog::{CatalogStore, InMemoryCatalogStore, NewBook};
//! use library_catalog::config::LibraryConfig;
//! use library_catalog::notify::EventProducer;
//! use library_catalog::service::CatalogService;
//! use library_catalog::Shutdown;
//!
//! let config = LibraryConfig::default();
//! let store = InMemoryCatalogStore::new();
//! let author = store.add_author("Ursula K. Le Guin").unwrap();
//! let shutdown = Shutdown::new();
//! let background = BackgroundTasks::start(config.background.settings(), shutdown.clone());
//! let background = Arc::new(background.unwrap());
//!
//! let service = CatalogService::new(
//!     Arc::new(store),
//!     Arc::new(InMemoryCacheStore::new()),
//!     EventProducer::from_config(InMemoryLog::new(), &config.notifier),
//!     background.clone(),
//!     &config.cache,
//! );
//!
//! let book = service
//!     .add_book(NewBook::new(author.id, "The Dispossessed", 1974, "Sci-Fi"))
//!     .unwrap();
//! service.view_book(book.id, 1).unwrap();
//! assert_eq!(service.book_views_count(book.id), 1);
//! shutdown.trigger();
//! background.stop();
//! ```

mod catalog_service;
mod error;

pub use catalog_service::CatalogService;
pub use error::CatalogError;
