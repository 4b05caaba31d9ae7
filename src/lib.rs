//! Library catalog read layer and book-added notifications.
//!
//! The read side keeps derived data in a shared cache: distinct viewers per
//! book ([`views::ViewCounter`]), a popularity ranking
//! ([`views::PopularityRanker`]) and cache-aside copies of the category and
//! new-books lists ([`cache_aside::CacheAside`]). The write side stores a
//! book and publishes a [`notify::BookAddedEvent`]; a
//! [`notify::NotificationDispatcher`] consumes those events and emails every
//! subscriber of the book's category through a bounded
//! [`worker_pool::WorkerPool`].
//!
//! [`service::CatalogService`] is the facade request handlers use.

pub mod bus;
pub mod cache;
pub mod cache_aside;
pub mod catalog;
pub mod config;
pub mod notify;
pub mod service;
mod shutdown;
pub mod views;
pub mod worker_pool;

pub use cache::{CacheError, CacheStore, InMemoryCacheStore};
pub use catalog::{Book, BookId, CatalogStore, InMemoryCatalogStore, NewBook, StoreError};
pub use config::LibraryConfig;
pub use notify::{BookAddedEvent, DispatcherThread, EventProducer, NotificationDispatcher};
pub use service::{CatalogError, CatalogService};
pub use shutdown::Shutdown;
pub use views::{PopularityRanker, ViewCounter};
pub use worker_pool::{BatchReport, PoolSettings, WorkerPool};
