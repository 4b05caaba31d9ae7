use serde::{Deserialize, Serialize};

pub type BookId = u64;
pub type AuthorId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
}

/// A catalog entry as stored in the authoritative store.
///
/// `category` is always lower-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub author_id: AuthorId,
    pub title: String,
    pub year: i32,
    pub category: String,
}

/// Fields of a book that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub author_id: AuthorId,
    pub title: String,
    pub year: i32,
    category: String,
}

impl NewBook {
    pub fn new(
        author_id: AuthorId,
        title: impl Into<String>,
        year: i32,
        category: impl AsRef<str>,
    ) -> Self {
        Self {
            author_id,
            title: title.into(),
            year,
            category: normalize_category(category.as_ref()),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub(crate) fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            author_id: self.author_id,
            title: self.title,
            year: self.year,
            category: self.category,
        }
    }
}

/// Result of a committed `add_book` transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedBook {
    pub book: Book,
    pub author_name: String,
}

/// Canonical form of a category name: trimmed and lower-cased.
pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_book_normalizes_category() {
        let book = NewBook::new(7, "X", 2001, "  Sci-Fi ");
        assert_eq!(book.category(), "sci-fi");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_category("ÉPOPÉE");
        assert_eq!(normalize_category(&once), once);
        assert_eq!(once, "épopée");
    }
}
