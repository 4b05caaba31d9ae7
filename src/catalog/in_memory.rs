//! InMemoryCatalogStore - BTreeMap-backed catalog for tests and development.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use super::{AddedBook, Author, AuthorId, Book, BookId, CatalogStore, NewBook, StoreError};

#[derive(Default)]
struct Tables {
    authors: HashMap<AuthorId, Author>,
    books: BTreeMap<BookId, Book>,
    titles: BTreeSet<(AuthorId, String)>,
    next_author_id: AuthorId,
    next_book_id: BookId,
}

/// In-memory catalog store.
///
/// Ids are assigned sequentially from 1, so a higher id means a newer book.
/// Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn add_author(&self, name: &str) -> Result<Author, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("add_author"))?;

        tables.next_author_id += 1;
        let author = Author {
            id: tables.next_author_id,
            name: name.to_string(),
        };
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    fn add_book(&self, book: NewBook) -> Result<AddedBook, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("add_book"))?;

        let author_name = tables
            .authors
            .get(&book.author_id)
            .map(|a| a.name.clone())
            .ok_or(StoreError::UnknownAuthor(book.author_id))?;

        let title_key = (book.author_id, book.title.clone());
        if tables.titles.contains(&title_key) {
            return Err(StoreError::DuplicateTitle {
                author_id: book.author_id,
                title: book.title,
            });
        }

        tables.next_book_id += 1;
        let book = book.into_book(tables.next_book_id);
        tables.titles.insert(title_key);
        tables.books.insert(book.id, book.clone());

        Ok(AddedBook { book, author_name })
    }

    fn book(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("book"))?;
        Ok(tables.books.get(&id).cloned())
    }

    fn books_by_ids(&self, ids: &[BookId]) -> Result<Vec<Book>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("books_by_ids"))?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.books.get(id).cloned())
            .collect())
    }

    fn categories(&self) -> Result<Vec<String>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("categories"))?;
        let categories: BTreeSet<&String> = tables.books.values().map(|b| &b.category).collect();
        Ok(categories.into_iter().cloned().collect())
    }

    fn new_books(&self, limit: usize) -> Result<Vec<Book>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("new_books"))?;
        Ok(tables.books.values().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_author() -> (InMemoryCatalogStore, Author) {
        let store = InMemoryCatalogStore::new();
        let author = store.add_author("Ursula").unwrap();
        (store, author)
    }

    #[test]
    fn add_book_assigns_ids_and_returns_author_name() {
        let (store, author) = store_with_author();
        let added = store
            .add_book(NewBook::new(author.id, "The Dispossessed", 1974, "Sci-Fi"))
            .unwrap();

        assert_eq!(added.book.id, 1);
        assert_eq!(added.book.category, "sci-fi");
        assert_eq!(added.author_name, "Ursula");
        assert_eq!(store.book(1).unwrap(), Some(added.book));
    }

    #[test]
    fn add_book_rejects_unknown_author() {
        let store = InMemoryCatalogStore::new();
        let err = store.add_book(NewBook::new(9, "X", 2000, "misc")).unwrap_err();
        assert_eq!(err, StoreError::UnknownAuthor(9));
        assert!(store.new_books(10).unwrap().is_empty());
    }

    #[test]
    fn add_book_rejects_duplicate_title_per_author() {
        let (store, author) = store_with_author();
        let other = store.add_author("Iain").unwrap();
        store
            .add_book(NewBook::new(author.id, "X", 2000, "misc"))
            .unwrap();

        assert!(matches!(
            store.add_book(NewBook::new(author.id, "X", 2001, "misc")),
            Err(StoreError::DuplicateTitle { .. })
        ));
        // same title, different author is fine
        assert!(store.add_book(NewBook::new(other.id, "X", 2001, "misc")).is_ok());
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let (store, author) = store_with_author();
        for (title, category) in [("a", "Poetry"), ("b", "fantasy"), ("c", "POETRY")] {
            store
                .add_book(NewBook::new(author.id, title, 2000, category))
                .unwrap();
        }
        assert_eq!(store.categories().unwrap(), vec!["fantasy", "poetry"]);
    }

    #[test]
    fn new_books_are_newest_first() {
        let (store, author) = store_with_author();
        for title in ["a", "b", "c"] {
            store
                .add_book(NewBook::new(author.id, title, 2000, "misc"))
                .unwrap();
        }
        let titles: Vec<_> = store
            .new_books(2)
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["c", "b"]);
    }

    #[test]
    fn books_by_ids_preserves_order_and_skips_missing() {
        let (store, author) = store_with_author();
        for title in ["a", "b"] {
            store
                .add_book(NewBook::new(author.id, title, 2000, "misc"))
                .unwrap();
        }
        let ids: Vec<_> = store
            .books_by_ids(&[2, 99, 1])
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
