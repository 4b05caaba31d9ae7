use thiserror::Error;

use super::LookupError;
use crate::bus::BusError;
use crate::worker_pool::PoolError;

/// Why one dispatcher cycle did not commit its event.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to fetch from the log: {0}")]
    Fetch(#[source] BusError),

    #[error("event at offset {offset} could not be decoded: {reason}")]
    Decode { offset: u64, reason: String },

    #[error("subscriber lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("worker pool refused the batch: {0}")]
    Pool(#[from] PoolError),

    #[error("cancelled before the batch was submitted")]
    Cancelled,

    #[error("failed to commit offset: {0}")]
    Commit(#[source] BusError),

    #[error("consumer reads `{subscribed}` but the notifier is configured for `{configured}`")]
    TopicMismatch {
        configured: String,
        subscribed: String,
    },
}

impl DispatchError {
    /// Errors after which the loop can keep going. A closed consumer or a
    /// stopped pool will not recover.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            DispatchError::Fetch(BusError::Closed)
                | DispatchError::Commit(BusError::Closed)
                | DispatchError::Pool(PoolError::Stopped(_) | PoolError::NotRunning(_))
                | DispatchError::TopicMismatch { .. }
        )
    }
}
