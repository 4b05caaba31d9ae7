//! The consumer loop of the notification pipeline.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::{BookAddedEvent, DispatchError, SubscriberLookup, TimedLookup};
use crate::bus::{Delivery, Subscriber};
use crate::catalog::normalize_category;
use crate::config::NotifierConfig;
use crate::shutdown::Shutdown;
use crate::worker_pool::{BatchReport, WorkerPool};

/// One email to send: the event and a single recipient.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub event: Arc<BookAddedEvent>,
    pub recipient: String,
}

impl NotificationJob {
    pub fn new(event: Arc<BookAddedEvent>, recipient: impl Into<String>) -> Self {
        Self {
            event,
            recipient: recipient.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Fetching,
    Processing,
    Committing,
    Stopping,
}

/// Counters kept across the dispatcher's lifetime.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatcherStats {
    pub polls: usize,
    /// Events whose batch was fed to the pool.
    pub events_processed: usize,
    pub events_committed: usize,
    /// Events rewound because decoding or lookup failed.
    pub events_failed: usize,
    pub emails_sent: usize,
    pub emails_failed: usize,
}

/// Outcome of one [`NotificationDispatcher::run_once`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    /// The poll timed out with nothing to do.
    Idle,
    Committed { offset: u64, report: BatchReport },
    Stopped,
}

/// Consumes `book-added` events and fans each one out into the email pool.
///
/// A cycle is fetch → decode → look up subscribers → `feed` the batch →
/// commit. The commit happens once `feed` returns, whatever the individual
/// sends did. When decoding or the lookup fails the delivery is rewound
/// instead, so the same event comes back on the next fetch or after a
/// restart of the consumer group.
pub struct NotificationDispatcher<S> {
    subscriber: S,
    lookup: TimedLookup,
    pool: Arc<WorkerPool<NotificationJob>>,
    poll_timeout_ms: u64,
    state: DispatcherState,
    stats: DispatcherStats,
}

impl<S: Subscriber> NotificationDispatcher<S> {
    /// `pool` must already be running.
    pub fn new(
        subscriber: S,
        lookup: Arc<dyn SubscriberLookup>,
        pool: Arc<WorkerPool<NotificationJob>>,
        config: &NotifierConfig,
    ) -> Self {
        Self {
            subscriber,
            lookup: TimedLookup::new(lookup, config.lookup_timeout()),
            pool,
            poll_timeout_ms: config.poll_timeout_ms,
            state: DispatcherState::Idle,
            stats: DispatcherStats::default(),
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn stats(&self) -> &DispatcherStats {
        &self.stats
    }

    pub fn subscriber(&self) -> &S {
        &self.subscriber
    }

    /// Run a single fetch/process/commit cycle.
    pub fn run_once(&mut self, shutdown: &Shutdown) -> Result<Cycle, DispatchError> {
        if shutdown.is_triggered() {
            self.state = DispatcherState::Stopping;
            return Ok(Cycle::Stopped);
        }

        self.state = DispatcherState::Fetching;
        self.stats.polls += 1;
        let delivery = match self.subscriber.poll(self.poll_timeout_ms) {
            Ok(Some(delivery)) => delivery,
            Ok(None) => {
                self.state = DispatcherState::Idle;
                return Ok(Cycle::Idle);
            }
            Err(err) => {
                self.state = DispatcherState::Idle;
                return Err(DispatchError::Fetch(err));
            }
        };

        self.state = DispatcherState::Processing;
        let report = match self.process(&delivery, shutdown) {
            Ok(report) => report,
            Err(err) => {
                if !matches!(err, DispatchError::Cancelled) {
                    self.stats.events_failed += 1;
                }
                if let Err(nack_err) = self.subscriber.nack(&delivery, &err.to_string()) {
                    warn!(offset = delivery.offset, error = %nack_err, "failed to rewind delivery");
                }
                self.state = DispatcherState::Idle;
                return Err(err);
            }
        };

        self.state = DispatcherState::Committing;
        let committed = self.subscriber.ack(&delivery);
        self.state = DispatcherState::Idle;
        committed.map_err(DispatchError::Commit)?;
        self.stats.events_committed += 1;
        debug!(offset = delivery.offset, ?report, "event committed");

        Ok(Cycle::Committed {
            offset: delivery.offset,
            report,
        })
    }

    fn process(
        &mut self,
        delivery: &Delivery,
        shutdown: &Shutdown,
    ) -> Result<BatchReport, DispatchError> {
        let mut event: BookAddedEvent =
            delivery
                .message
                .decode_json()
                .map_err(|err| DispatchError::Decode {
                    offset: delivery.offset,
                    reason: err.to_string(),
                })?;
        event.category = normalize_category(&event.category);

        let recipients = self.lookup.subscribers_for(&event.category)?;
        if shutdown.is_triggered() {
            return Err(DispatchError::Cancelled);
        }

        let event = Arc::new(event);
        let jobs: Vec<_> = recipients
            .into_iter()
            .map(|recipient| NotificationJob::new(Arc::clone(&event), recipient))
            .collect();

        info!(
            book_id = event.id,
            category = %event.category,
            offset = delivery.offset,
            recipients = jobs.len(),
            "dispatching notifications"
        );
        let report = self.pool.feed(jobs)?;

        self.stats.events_processed += 1;
        self.stats.emails_sent += report.succeeded;
        self.stats.emails_failed += report.failed + report.panicked;
        Ok(report)
    }

    /// Loop until `shutdown` fires or the consumer can no longer make
    /// progress, then stop the pool and close the consumer.
    pub fn run(mut self, shutdown: &Shutdown) -> DispatcherStats {
        info!(pool = %self.pool.name(), "notification dispatcher started");

        loop {
            match self.run_once(shutdown) {
                Ok(Cycle::Stopped) => break,
                Ok(_) | Err(DispatchError::Cancelled) => {}
                Err(err) if err.is_transient() => {
                    warn!(error = %err, "dispatcher cycle failed");
                }
                Err(err) => {
                    error!(error = %err, "dispatcher cannot continue");
                    break;
                }
            }
        }

        self.state = DispatcherState::Stopping;
        self.pool.stop();
        self.subscriber.close();
        info!(stats = ?self.stats, "notification dispatcher stopped");
        self.stats
    }
}
