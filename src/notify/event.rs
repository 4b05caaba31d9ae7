use serde::{Deserialize, Serialize};

use crate::catalog::{AddedBook, AuthorId, BookId};

/// Topic carrying [`BookAddedEvent`]s.
pub const BOOK_ADDED_TOPIC: &str = "book-added";

/// Fact: a book was committed to the catalog.
///
/// Wire format (JSON):
/// `{"id":1,"authorId":7,"authorName":"...","title":"...","year":2001,"category":"sci-fi"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAddedEvent {
    pub id: BookId,
    pub author_id: AuthorId,
    pub author_name: String,
    pub title: String,
    pub year: i32,
    pub category: String,
}

impl BookAddedEvent {
    /// Stable message id; a re-published event keeps the same id.
    pub fn message_id(&self) -> String {
        format!("{}:{}", BOOK_ADDED_TOPIC, self.id)
    }
}

impl From<&AddedBook> for BookAddedEvent {
    fn from(added: &AddedBook) -> Self {
        Self {
            id: added.book.id,
            author_id: added.book.author_id,
            author_name: added.author_name.clone(),
            title: added.book.title.clone(),
            year: added.book.year,
            category: added.book.category.clone(),
        }
    }
}
