use tracing::debug;

use crate::shutdown::Shutdown;
use crate::worker_pool::{JobResult, PoolError, PoolSettings, WorkerPool};

type Task = Box<dyn FnOnce() -> JobResult + Send>;

/// Small bounded pool for fire-and-forget maintenance work such as cache
/// repopulation.
///
/// Submitting never blocks the caller: a task that does not fit the queue
/// is handed back as `PoolError::QueueFull`. Once `shutdown` is triggered
/// new tasks are refused with `PoolError::Stopped`. `stop` (or dropping the
/// handle) runs whatever is already queued and then joins the workers.
pub struct BackgroundTasks {
    pool: WorkerPool<Task>,
    shutdown: Shutdown,
}

impl BackgroundTasks {
    pub fn start(settings: PoolSettings, shutdown: Shutdown) -> Result<Self, PoolError> {
        let pool = WorkerPool::new("cache-refill", settings);
        pool.run(|task: Task| task())?;
        Ok(Self { pool, shutdown })
    }

    pub fn submit<F>(&self, label: &'static str, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() -> JobResult + Send + 'static,
    {
        if self.shutdown.is_triggered() {
            return Err(PoolError::Stopped(self.pool.name().to_string()));
        }
        self.pool.try_submit(Box::new(task))?;
        debug!(task = label, "background task queued");
        Ok(())
    }

    pub fn stop(&self) {
        self.pool.stop();
    }

    pub fn is_running(&self) -> bool {
        self.pool.is_running() && !self.shutdown.is_triggered()
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.pool.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn settings() -> PoolSettings {
        PoolSettings {
            workers: 1,
            queue_depth: 8,
        }
    }

    fn counting_task(ran: &Arc<AtomicUsize>) -> impl FnOnce() -> JobResult + Send + 'static {
        let ran = Arc::clone(ran);
        move || {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn queued_tasks_run_before_stop_returns() {
        let tasks = BackgroundTasks::start(settings(), Shutdown::new()).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            tasks.submit("count", counting_task(&ran)).unwrap();
        }
        tasks.stop();

        assert_eq!(ran.load(Ordering::SeqCst), 3);
        assert!(!tasks.is_running());
        assert!(matches!(
            tasks.submit("late", || Ok(())),
            Err(PoolError::NotRunning(_) | PoolError::Stopped(_))
        ));
    }

    #[test]
    fn shutdown_refuses_new_tasks() {
        let shutdown = Shutdown::new();
        let tasks = BackgroundTasks::start(settings(), shutdown.clone()).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));
        tasks.submit("before", counting_task(&ran)).unwrap();

        shutdown.trigger();

        assert!(!tasks.is_running());
        assert!(matches!(
            tasks.submit("after", counting_task(&ran)),
            Err(PoolError::Stopped(_))
        ));
        tasks.stop();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_the_handle_drains_the_queue() {
        let ran = Arc::new(AtomicUsize::new(0));
        {
            let tasks = BackgroundTasks::start(settings(), Shutdown::new()).unwrap();
            for _ in 0..4 {
                tasks.submit("count", counting_task(&ran)).unwrap();
            }
        }
        assert_eq!(ran.load(Ordering::SeqCst), 4);
    }
}
