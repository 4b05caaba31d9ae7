//! Background thread running a [`NotificationDispatcher`].

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::{
    email_job_handler, DispatchError, DispatcherStats, Mailer, NotificationDispatcher,
    SubscriberLookup,
};
use crate::bus::Subscriber;
use crate::config::LibraryConfig;
use crate::shutdown::Shutdown;
use crate::worker_pool::{PoolError, WorkerPool};

/// A dispatcher loop on its own thread.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use library_catalog::bus::InMemoryLog;
/// use library_catalog::config::LibraryConfig;
/// use library_catalog::notify::{DispatcherThread, LogMailer, StaticSubscribers};
/// use library_catalog::Shutdown;
///
/// let config = LibraryConfig::default();
/// let log = InMemoryLog::new();
/// let thread = DispatcherThread::start(
///     log.consumer(&config.notifier.topic, &config.notifier.consumer_group),
///     Arc::new(StaticSubscribers::new()),
///     Arc::new(LogMailer),
///     &config,
///     Shutdown::new(),
/// )
/// .unwrap();
///
/// let stats = thread.stop();
/// assert_eq!(stats.events_committed, 0);
/// ```
pub struct DispatcherThread {
    shutdown: Shutdown,
    handle: Option<JoinHandle<DispatcherStats>>,
}

impl DispatcherThread {
    /// Run an already-built dispatcher until `shutdown` fires.
    pub fn spawn<S>(
        dispatcher: NotificationDispatcher<S>,
        shutdown: Shutdown,
    ) -> io::Result<Self>
    where
        S: Subscriber + 'static,
    {
        let signal = shutdown.clone();
        let handle = thread::Builder::new()
            .name("notification-dispatcher".into())
            .spawn(move || dispatcher.run(&signal))?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Wire up the whole pipeline from configuration: start the email pool,
    /// build the dispatcher around `subscriber` and spawn it.
    ///
    /// `subscriber` must read `config.notifier.topic`.
    pub fn start<S>(
        subscriber: S,
        lookup: Arc<dyn SubscriberLookup>,
        mailer: Arc<dyn Mailer>,
        config: &LibraryConfig,
        shutdown: Shutdown,
    ) -> Result<Self, DispatchError>
    where
        S: Subscriber + 'static,
    {
        if subscriber.topic() != config.notifier.topic {
            return Err(DispatchError::TopicMismatch {
                configured: config.notifier.topic.clone(),
                subscribed: subscriber.topic().to_string(),
            });
        }

        let pool = Arc::new(WorkerPool::new("email-worker", config.workers.settings()));
        pool.run(email_job_handler(
            mailer,
            config.notifier.sender_address.clone(),
        ))?;

        let dispatcher =
            NotificationDispatcher::new(subscriber, lookup, Arc::clone(&pool), &config.notifier);
        Self::spawn(dispatcher, shutdown).map_err(|err| {
            pool.stop();
            DispatchError::Pool(PoolError::Spawn(err))
        })
    }

    /// Trigger shutdown without waiting.
    pub fn signal_stop(&self) {
        self.shutdown.trigger();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Trigger shutdown, wait for the in-flight batch and the pool to
    /// drain, and return the statistics.
    pub fn stop(mut self) -> DispatcherStats {
        self.shutdown.trigger();
        self.handle
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }
}

impl Drop for DispatcherThread {
    fn drop(&mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
