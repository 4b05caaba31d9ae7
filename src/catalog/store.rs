use super::{AddedBook, Author, Book, BookId, NewBook, StoreError};

/// The authoritative (relational) catalog store.
///
/// Every method is a single transaction: it either fully applies or returns
/// an error with nothing written.
pub trait CatalogStore: Send + Sync {
    fn add_author(&self, name: &str) -> Result<Author, StoreError>;

    /// Insert a book. Fails with `UnknownAuthor` or `DuplicateTitle`.
    /// Returns the stored book along with its author's name.
    fn add_book(&self, book: NewBook) -> Result<AddedBook, StoreError>;

    fn book(&self, id: BookId) -> Result<Option<Book>, StoreError>;

    /// Books for the given ids, in the order of `ids`. Unknown ids are skipped.
    fn books_by_ids(&self, ids: &[BookId]) -> Result<Vec<Book>, StoreError>;

    /// Distinct categories, sorted.
    fn categories(&self) -> Result<Vec<String>, StoreError>;

    /// Up to `limit` books, most recently added first.
    fn new_books(&self, limit: usize) -> Result<Vec<Book>, StoreError>;
}
