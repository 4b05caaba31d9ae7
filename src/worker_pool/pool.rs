use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use crossbeam::sync::WaitGroup;
use tracing::{debug, error, info, warn};

use super::PoolError;

pub type JobError = Box<dyn std::error::Error + Send + Sync>;
pub type JobResult = Result<(), JobError>;

type WorkerBody = Box<dyn FnOnce() + Send + 'static>;
type SpawnFn = fn(String, WorkerBody) -> io::Result<JoinHandle<()>>;

fn spawn_named(name: String, body: WorkerBody) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name(name).spawn(body)
}

/// Fixed pool dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub workers: usize,
    pub queue_depth: usize,
}

/// Outcome of one `feed` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub submitted: usize,
    pub succeeded: usize,
    /// Jobs whose handler returned an error.
    pub failed: usize,
    /// Jobs whose handler panicked. The worker survives.
    pub panicked: usize,
}

#[derive(Default)]
struct BatchCounters {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    panicked: AtomicUsize,
}

struct Envelope<J> {
    job: J,
    counters: Arc<BatchCounters>,
    // Released after the job ran; `feed` waits for all of them.
    done: Option<WaitGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolState {
    Idle,
    Running,
    Stopped,
}

struct PoolInner<J> {
    state: PoolState,
    sender: Option<Sender<Envelope<J>>>,
    receiver: Option<Receiver<Envelope<J>>>,
    workers: Vec<JoinHandle<()>>,
}

/// A fixed-size pool of worker threads over one bounded job queue.
///
/// Lifecycle: `new` → `run(handler)` → any number of `feed` / `try_submit`
/// → `stop`. Dropping the pool without `stop` closes the queue and lets the
/// workers exit on their own once drained.
pub struct WorkerPool<J> {
    name: String,
    settings: PoolSettings,
    inner: Mutex<PoolInner<J>>,
    spawn: SpawnFn,
}

impl<J: Send + 'static> WorkerPool<J> {
    pub fn new(name: impl Into<String>, settings: PoolSettings) -> Self {
        let (sender, receiver) = channel::bounded(settings.queue_depth);
        Self {
            name: name.into(),
            settings,
            inner: Mutex::new(PoolInner {
                state: PoolState::Idle,
                sender: Some(sender),
                receiver: Some(receiver),
                workers: Vec::new(),
            }),
            spawn: spawn_named,
        }
    }

    #[cfg(test)]
    fn with_spawn(mut self, spawn: SpawnFn) -> Self {
        self.spawn = spawn;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> PoolSettings {
        self.settings
    }

    /// Start the workers. Each job is passed to `handler` on one of them.
    ///
    /// Every invocation is guarded: an `Err` or a panic is counted against
    /// the job's batch and the worker moves on to the next job.
    ///
    /// If a worker cannot be spawned the ones already started are shut down
    /// and joined, and the pool ends up `Stopped`.
    pub fn run<F>(&self, handler: F) -> Result<(), PoolError>
    where
        F: Fn(J) -> JobResult + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        match inner.state {
            PoolState::Idle => {}
            PoolState::Running => return Err(PoolError::AlreadyRunning(self.name.clone())),
            PoolState::Stopped => return Err(PoolError::Stopped(self.name.clone())),
        }

        let Some(receiver) = inner.receiver.take() else {
            return Err(PoolError::AlreadyRunning(self.name.clone()));
        };
        let handler = Arc::new(handler);

        for index in 0..self.settings.workers.max(1) {
            let jobs = receiver.clone();
            let handler = Arc::clone(&handler);
            let name = self.name.clone();
            let body: WorkerBody = Box::new(move || {
                for envelope in jobs.iter() {
                    execute(&name, handler.as_ref(), envelope);
                }
                debug!(pool = %name, worker = index, "worker exited");
            });
            match (self.spawn)(format!("{}-{}", self.name, index), body) {
                Ok(worker) => inner.workers.push(worker),
                Err(err) => {
                    error!(
                        pool = %self.name,
                        worker = index,
                        error = %err,
                        "failed to spawn worker"
                    );
                    inner.state = PoolState::Stopped;
                    inner.sender.take();
                    let started = std::mem::take(&mut inner.workers);
                    drop(inner);
                    drop(receiver);
                    for worker in started {
                        let _ = worker.join();
                    }
                    return Err(PoolError::Spawn(err));
                }
            }
        }

        inner.state = PoolState::Running;
        info!(
            pool = %self.name,
            workers = self.settings.workers,
            queue_depth = self.settings.queue_depth,
            "worker pool started"
        );
        Ok(())
    }

    /// Submit a batch and block until every job in it has been executed.
    ///
    /// Blocks on a full queue. Job failures do not fail the batch; they are
    /// reported in the returned [`BatchReport`].
    pub fn feed(&self, jobs: Vec<J>) -> Result<BatchReport, PoolError> {
        let sender = self.running_sender()?;
        let counters = Arc::new(BatchCounters::default());
        let barrier = WaitGroup::new();
        let submitted = jobs.len();

        for job in jobs {
            let envelope = Envelope {
                job,
                counters: Arc::clone(&counters),
                done: Some(barrier.clone()),
            };
            if sender.send(envelope).is_err() {
                // All workers are gone; nothing will drain the rest.
                return Err(PoolError::Stopped(self.name.clone()));
            }
        }
        drop(sender);
        barrier.wait();

        let report = BatchReport {
            submitted,
            succeeded: counters.succeeded.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
            panicked: counters.panicked.load(Ordering::SeqCst),
        };
        debug!(pool = %self.name, ?report, "batch drained");
        Ok(report)
    }

    /// Queue a single job without waiting for it, failing with `QueueFull`
    /// instead of blocking.
    pub fn try_submit(&self, job: J) -> Result<(), PoolError> {
        let sender = self.running_sender()?;
        let envelope = Envelope {
            job,
            counters: Arc::new(BatchCounters::default()),
            done: None,
        };
        match sender.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(PoolError::QueueFull(self.name.clone())),
            Err(TrySendError::Disconnected(_)) => Err(PoolError::Stopped(self.name.clone())),
        }
    }

    /// Close the queue, let the workers drain it and wait for them to exit.
    ///
    /// Batches already inside `feed` still complete. Idempotent.
    pub fn stop(&self) {
        let workers = {
            let mut inner = self.lock();
            if inner.state == PoolState::Stopped {
                return;
            }
            inner.state = PoolState::Stopped;
            inner.sender.take();
            inner.receiver.take();
            std::mem::take(&mut inner.workers)
        };

        for worker in workers {
            if worker.join().is_err() {
                error!(pool = %self.name, "worker thread panicked outside a job");
            }
        }
        info!(pool = %self.name, "worker pool stopped");
    }

    pub fn is_running(&self) -> bool {
        self.lock().state == PoolState::Running
    }

    fn running_sender(&self) -> Result<Sender<Envelope<J>>, PoolError> {
        let inner = self.lock();
        match (inner.state, inner.sender.as_ref()) {
            (PoolState::Running, Some(sender)) => Ok(sender.clone()),
            (PoolState::Idle, _) => Err(PoolError::NotRunning(self.name.clone())),
            _ => Err(PoolError::Stopped(self.name.clone())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner<J>> {
        // Nothing panics while holding this lock; recover the guard if it
        // was poisoned anyway.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn execute<J, F>(pool: &str, handler: &F, envelope: Envelope<J>)
where
    F: Fn(J) -> JobResult,
{
    let Envelope {
        job,
        counters,
        done,
    } = envelope;

    match panic::catch_unwind(AssertUnwindSafe(|| handler(job))) {
        Ok(Ok(())) => {
            counters.succeeded.fetch_add(1, Ordering::SeqCst);
        }
        Ok(Err(err)) => {
            counters.failed.fetch_add(1, Ordering::SeqCst);
            debug!(pool, error = %err, "job failed");
        }
        Err(payload) => {
            counters.panicked.fetch_add(1, Ordering::SeqCst);
            warn!(pool, panic = %panic_message(payload.as_ref()), "job panicked");
        }
    }

    drop(done);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
