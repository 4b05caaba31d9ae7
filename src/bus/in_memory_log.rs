//! In-memory durable log for testing and single-process scenarios.
//!
//! Messages are appended per topic and never removed. Each consumer group
//! has one committed offset; each consumer has its own read position that
//! starts at the group's committed offset. Creating a new consumer for an
//! existing group therefore behaves like a restarted process: anything that
//! was fetched but not acknowledged is delivered again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{BusError, Delivery, Message, Publisher, Subscriber};

#[derive(Default)]
struct LogState {
    topics: HashMap<String, Vec<Message>>,
    /// (topic, group) → next offset to consume
    committed: HashMap<(String, String), u64>,
    commits: u64,
}

/// In-memory log.
///
/// Thread-safe and clone-friendly: clones share the same topics and
/// committed offsets.
///
/// ## Example
///
/// ```
/// use library_catalog::bus::{InMemoryLog, Message, Publisher, Subscriber};
///
/// let log = InMemoryLog::new();
/// log.publish(Message::new("m-1", "book-added", b"{}".to_vec())).unwrap();
///
/// let consumer = log.consumer("book-added", "mailers");
/// let delivery = consumer.poll(10).unwrap().unwrap();
/// assert_eq!(delivery.offset, 0);
/// consumer.ack(&delivery).unwrap();
/// assert_eq!(log.committed_offset("book-added", "mailers"), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryLog {
    state: Arc<RwLock<LogState>>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a consumer for `topic` in `group`, positioned at the group's
    /// committed offset.
    pub fn consumer(&self, topic: &str, group: &str) -> InMemoryConsumer {
        let start = self.committed_offset(topic, group);
        InMemoryConsumer {
            log: self.clone(),
            topic: topic.to_string(),
            group: group.to_string(),
            position: Arc::new(AtomicU64::new(start)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// All messages of a topic, in log order.
    pub fn messages(&self, topic: &str) -> Vec<Message> {
        self.read()
            .map(|state| state.topics.get(topic).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Number of messages in a topic.
    pub fn len(&self, topic: &str) -> usize {
        self.read()
            .map(|state| state.topics.get(topic).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Next offset `group` will consume from `topic` after a restart.
    pub fn committed_offset(&self, topic: &str, group: &str) -> u64 {
        self.read()
            .ok()
            .and_then(|state| {
                state
                    .committed
                    .get(&(topic.to_string(), group.to_string()))
                    .copied()
            })
            .unwrap_or(0)
    }

    /// Total number of successful commits across all groups.
    pub fn commit_count(&self) -> u64 {
        self.read().map(|state| state.commits).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LogState>, BusError> {
        self.state
            .read()
            .map_err(|_| BusError::LockPoisoned("log read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LogState>, BusError> {
        self.state
            .write()
            .map_err(|_| BusError::LockPoisoned("log write"))
    }
}

impl Publisher for InMemoryLog {
    fn publish(&self, message: Message) -> Result<(), BusError> {
        let mut state = self.write()?;
        let topic = state.topics.entry(message.topic.clone()).or_default();
        debug!(topic = %message.topic, offset = topic.len(), id = %message.id, "message appended");
        topic.push(message);
        Ok(())
    }

    fn publish_batch(&self, messages: Vec<Message>) -> Result<(), BusError> {
        let mut state = self.write()?;
        for message in messages {
            state
                .topics
                .entry(message.topic.clone())
                .or_default()
                .push(message);
        }
        Ok(())
    }
}

/// One consumer of an [`InMemoryLog`] topic within a consumer group.
#[derive(Clone)]
pub struct InMemoryConsumer {
    log: InMemoryLog,
    topic: String,
    group: String,
    position: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl InMemoryConsumer {
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Offset of the next message this consumer will fetch.
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), BusError> {
        if self.is_closed() {
            Err(BusError::Closed)
        } else {
            Ok(())
        }
    }

    fn try_fetch(&self) -> Result<Option<Delivery>, BusError> {
        let state = self.log.read()?;
        let offset = self.position.load(Ordering::SeqCst);
        let next = state
            .topics
            .get(&self.topic)
            .and_then(|messages| messages.get(offset as usize))
            .cloned();

        Ok(next.map(|message| {
            self.position.store(offset + 1, Ordering::SeqCst);
            Delivery { offset, message }
        }))
    }
}

impl Subscriber for InMemoryConsumer {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn poll(&self, timeout_ms: u64) -> Result<Option<Delivery>, BusError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            self.ensure_open()?;
            if let Some(delivery) = self.try_fetch()? {
                return Ok(Some(delivery));
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }

            // Small sleep to avoid busy-waiting
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn ack(&self, delivery: &Delivery) -> Result<(), BusError> {
        self.ensure_open()?;
        let mut state = self.log.write()?;
        let committed = state
            .committed
            .entry((self.topic.clone(), self.group.clone()))
            .or_insert(0);
        *committed = (*committed).max(delivery.offset + 1);
        state.commits += 1;
        debug!(
            topic = %self.topic,
            group = %self.group,
            offset = delivery.offset,
            "offset committed"
        );
        Ok(())
    }

    fn nack(&self, delivery: &Delivery, reason: &str) -> Result<(), BusError> {
        self.ensure_open()?;
        self.position.fetch_min(delivery.offset, Ordering::SeqCst);
        debug!(
            topic = %self.topic,
            group = %self.group,
            offset = delivery.offset,
            reason,
            "delivery rewound"
        );
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
