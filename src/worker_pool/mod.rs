//! Bounded worker pool with a batch barrier.
//!
//! N long-lived worker threads pull jobs from one shared bounded queue.
//! [`WorkerPool::feed`] submits a batch and returns only once every job of
//! that batch has been executed; a full queue blocks the submitter, which
//! throttles it to the pool's throughput.
//!
//! ## Example
//!
//! ```
//! use library_catalog::worker_pool::{PoolSettings, WorkerPool};
//!
//! let pool = WorkerPool::new("doubler", PoolSettings { workers: 2, queue_depth: 4 });
//! pool.run(|n: u32| {
//!     let _ = n * 2;
//!     Ok(())
//! })
//! .unwrap();
//!
//! let report = pool.feed(vec![1, 2, 3]).unwrap();
//! assert_eq!(report.succeeded, 3);
//! pool.stop();
//! ```

mod error;
mod pool;

pub use error::PoolError;
pub use pool::{BatchReport, JobError, JobResult, PoolSettings, WorkerPool};
