use std::sync::Arc;

use tracing::{debug, warn};

use super::PopularityRanker;
use crate::cache::{keys, CacheError, CacheStore};
use crate::catalog::BookId;

pub type UserId = u64;

/// Counts distinct viewers per book.
///
/// Viewers are tracked in a HyperLogLog per book (`books:{id}:views`), so
/// memory stays bounded however many users view a book, at the cost of a
/// small estimation error. Every add that moves the estimate moves the
/// book's popularity score by the same amount, so the score stays equal to
/// the viewer count.
#[derive(Clone)]
pub struct ViewCounter {
    cache: Arc<dyn CacheStore>,
    ranker: PopularityRanker,
}

impl ViewCounter {
    pub fn new(cache: Arc<dyn CacheStore>, ranker: PopularityRanker) -> Self {
        Self { cache, ranker }
    }

    /// Record that `user_id` viewed `book_id`.
    ///
    /// Returns `true` for a new distinct viewer. Repeats return `false` and
    /// leave the popularity score alone. A failed score update is logged and
    /// does not fail the call.
    pub fn register_view(&self, book_id: BookId, user_id: UserId) -> Result<bool, CacheError> {
        let update = self
            .cache
            .hll_add_delta(&keys::book_views(book_id), &user_id.to_string())?;

        if update.delta != 0 {
            if let Err(err) = self.ranker.increment_score(book_id, update.delta) {
                warn!(
                    book_id,
                    delta = update.delta,
                    error = %err,
                    "failed to update popularity score"
                );
            }
        }
        if !update.changed {
            debug!(book_id, user_id, "repeat view");
        }

        Ok(update.changed)
    }

    /// Estimated number of distinct viewers. 0 for books never viewed.
    pub fn view_count(&self, book_id: BookId) -> Result<u64, CacheError> {
        self.cache.hll_count(&keys::book_views(book_id))
    }
}
