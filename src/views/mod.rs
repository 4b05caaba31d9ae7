//! View counting and popularity ranking.
//!
//! `ViewCounter` deduplicates views per (book, user) and feeds
//! `PopularityRanker`, which answers "most viewed books". Both only touch the
//! cache; the score of a book converges to its distinct-viewer count.

mod ranker;
mod view_counter;

pub use ranker::PopularityRanker;
pub use view_counter::{UserId, ViewCounter};
