//! Core consumer types for the event log.

use super::{BusError, Message};

/// A message handed to a consumer, together with its position in the topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub offset: u64,
    pub message: Message,
}

/// Pull-based consumer bound to one topic and one consumer group.
///
/// Offsets are committed manually: nothing is considered consumed until
/// `ack` is called for it.
pub trait Subscriber: Send + Sync {
    /// Topic this consumer reads.
    fn topic(&self) -> &str;

    /// Fetch the next message, blocking until one is available or the
    /// timeout elapses.
    fn poll(&self, timeout_ms: u64) -> Result<Option<Delivery>, BusError>;

    /// Commit the group offset past this delivery.
    fn ack(&self, delivery: &Delivery) -> Result<(), BusError>;

    /// Give the delivery back without committing it; the next `poll`
    /// returns it again.
    fn nack(&self, delivery: &Delivery, reason: &str) -> Result<(), BusError>;

    /// Release the connection. Later calls fail with `BusError::Closed`.
    fn close(&self) {}
}
