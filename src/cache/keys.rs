//! Cache key schema shared by the read-side components.

/// List of category names.
pub const CATEGORIES: &str = "categories";

/// Serialized snapshot of the newest books.
pub const NEW_BOOKS: &str = "books:new";

/// Sorted set of book id → distinct viewer count.
pub const POPULAR_BOOKS: &str = "books:popular";

/// HyperLogLog of the users who viewed a book.
pub fn book_views(book_id: u64) -> String {
    format!("books:{}:views", book_id)
}
