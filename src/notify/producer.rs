use tracing::info;

use super::{BookAddedEvent, BOOK_ADDED_TOPIC};
use crate::bus::{BusError, Message, Publisher};
use crate::config::NotifierConfig;

/// Publishes [`BookAddedEvent`]s to the log.
///
/// Only call this after the creating transaction has committed. The
/// producer does not retry; a failed publish means subscribers are not
/// told about that book.
pub struct EventProducer<P> {
    publisher: P,
    topic: String,
}

impl<P: Publisher> EventProducer<P> {
    pub fn new(publisher: P) -> Self {
        Self {
            publisher,
            topic: BOOK_ADDED_TOPIC.to_string(),
        }
    }

    /// Publish to the topic named in `config`.
    pub fn from_config(publisher: P, config: &NotifierConfig) -> Self {
        Self::new(publisher).with_topic(config.topic.clone())
    }

    /// Publish to a different topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Get a reference to the underlying publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Serialize the event and append it, keyed by book id.
    pub fn publish(&self, event: &BookAddedEvent) -> Result<(), BusError> {
        let message = Message::json(event.message_id(), &self.topic, event)?
            .with_key(event.id.to_string());
        self.publisher.publish(message)?;
        info!(
            book_id = event.id,
            category = %event.category,
            topic = %self.topic,
            "book-added event published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryLog;

    #[test]
    fn publishes_json_keyed_by_book_id() {
        let log = InMemoryLog::new();
        let producer = EventProducer::new(log.clone());
        let event = BookAddedEvent {
            id: 3,
            author_id: 7,
            author_name: "Ann".into(),
            title: "X".into(),
            year: 2001,
            category: "sci-fi".into(),
        };

        producer.publish(&event).unwrap();

        let messages = log.messages(BOOK_ADDED_TOPIC);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].key.as_deref(), Some("3"));
        assert_eq!(messages[0].decode_json::<BookAddedEvent>().unwrap(), event);
    }

    #[test]
    fn custom_topic() {
        let log = InMemoryLog::new();
        let producer = EventProducer::new(log.clone()).with_topic("books-v2");
        assert_eq!(producer.topic(), "books-v2");
    }

    #[test]
    fn configured_topic_is_used() {
        let log = InMemoryLog::new();
        let config = NotifierConfig {
            topic: "books-v2".into(),
            ..NotifierConfig::default()
        };
        let producer = EventProducer::from_config(log.clone(), &config);
        let event = BookAddedEvent {
            id: 1,
            author_id: 7,
            author_name: "Ann".into(),
            title: "X".into(),
            year: 2001,
            category: "poetry".into(),
        };

        producer.publish(&event).unwrap();

        assert_eq!(log.messages("books-v2").len(), 1);
        assert!(log.messages(BOOK_ADDED_TOPIC).is_empty());
    }
}
