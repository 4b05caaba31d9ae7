//! Core publisher types for the event log.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// A message on the durable log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier for this message
    pub id: String,
    /// Topic the message belongs to (e.g., "book-added")
    pub topic: String,
    /// Partitioning key, if any
    pub key: Option<String>,
    /// Serialized payload
    pub payload: Vec<u8>,
    /// Free-form headers (correlation IDs, content type, ...)
    pub headers: Vec<(String, String)>,
}

impl Message {
    pub fn new(id: impl Into<String>, topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            key: None,
            payload,
            headers: Vec::new(),
        }
    }

    /// Create a message with a JSON payload.
    pub fn json<T: Serialize>(
        id: impl Into<String>,
        topic: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(payload)?;
        Ok(Self::new(id, topic, bytes).with_header("content-type", "application/json"))
    }

    /// Decode a JSON payload.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get the payload as a string (if valid UTF-8).
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Error type for log operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// Connection to the log failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Serialization of the message failed
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
    /// The consumer was closed
    #[error("consumer closed")]
    Closed,
    #[error("log lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

impl From<serde_json::Error> for BusError {
    fn from(err: serde_json::Error) -> Self {
        BusError::SerializationFailed(err.to_string())
    }
}

/// Trait for appending messages to the log.
///
/// Implementations might include:
/// - `InMemoryLog` - For testing and single-process scenarios
/// - a Kafka producer
/// - a Redis Streams producer
pub trait Publisher: Send + Sync {
    /// Append a single message to its topic.
    fn publish(&self, message: Message) -> Result<(), BusError>;

    /// Append multiple messages.
    ///
    /// Default implementation publishes messages sequentially.
    fn publish_batch(&self, messages: Vec<Message>) -> Result<(), BusError> {
        for message in messages {
            self.publish(message)?;
        }
        Ok(())
    }
}
