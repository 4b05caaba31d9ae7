//! Catalog - the authoritative store of books and authors.
//!
//! Everything in the read layer is derived from what a `CatalogStore`
//! returns; nothing here knows about caches.

mod book;
mod error;
mod in_memory;
mod store;

pub use book::{normalize_category, AddedBook, Author, AuthorId, Book, BookId, NewBook};
pub use error::StoreError;
pub use in_memory::InMemoryCatalogStore;
pub use store::CatalogStore;
