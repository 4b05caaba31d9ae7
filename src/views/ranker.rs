use std::sync::Arc;

use tracing::debug;

use crate::cache::{keys, CacheError, CacheStore};
use crate::catalog::BookId;

/// Book popularity as a sorted set of book id → score.
///
/// Holds ids and scores only. Turning ids into books is the caller's job, so
/// edits to book metadata never leave a stale copy here.
#[derive(Clone)]
pub struct PopularityRanker {
    cache: Arc<dyn CacheStore>,
}

impl PopularityRanker {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Atomically add `delta` to a book's score. Returns the new score.
    pub fn increment_score(&self, book_id: BookId, delta: i64) -> Result<i64, CacheError> {
        let score = self
            .cache
            .zincr_by(keys::POPULAR_BOOKS, &book_id.to_string(), delta)?;
        debug!(book_id, delta, score, "popularity score updated");
        Ok(score)
    }

    pub fn score(&self, book_id: BookId) -> Result<i64, CacheError> {
        Ok(self
            .cache
            .zscore(keys::POPULAR_BOOKS, &book_id.to_string())?
            .unwrap_or(0))
    }

    /// Up to `n` book ids, highest score first. Ties go to the book updated
    /// most recently.
    pub fn top_n(&self, n: usize) -> Result<Vec<BookId>, CacheError> {
        self.cache
            .zrev_range(keys::POPULAR_BOOKS, n)?
            .into_iter()
            .map(|(member, _)| {
                member.parse::<BookId>().map_err(|_| {
                    CacheError::Codec(format!(
                        "`{}` in {} is not a book id",
                        member,
                        keys::POPULAR_BOOKS
                    ))
                })
            })
            .collect()
    }
}
