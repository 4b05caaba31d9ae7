//! Error type for worker pool operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    /// `run` was called on a pool that already has workers.
    #[error("worker pool `{0}` is already running")]
    AlreadyRunning(String),

    /// Work was submitted before `run`.
    #[error("worker pool `{0}` has no workers; call run() first")]
    NotRunning(String),

    /// Work was submitted after `stop`.
    #[error("worker pool `{0}` is stopped")]
    Stopped(String),

    /// A non-blocking submit found the queue full.
    #[error("worker pool `{0}` queue is full")]
    QueueFull(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
