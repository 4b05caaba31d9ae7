//! Error type for the authoritative catalog store.

use thiserror::Error;

use super::AuthorId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("catalog store lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("author {0} does not exist")]
    UnknownAuthor(AuthorId),

    /// `(author_id, title)` is already taken.
    #[error("author {author_id} already has a book titled `{title}`")]
    DuplicateTitle { author_id: AuthorId, title: String },
}
