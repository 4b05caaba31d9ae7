use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Settings for the book-added consumer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotifierConfig {
    /// Topic book-added events are published to and consumed from.
    #[serde(default = "default_topic")]
    pub topic: String,

    /// All dispatcher instances sharing this group split the topic and share
    /// one committed offset.
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,

    /// Upper bound on one subscriber lookup (unit: milliseconds)
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// How long a single fetch waits before re-checking the shutdown signal
    /// (unit: milliseconds)
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// `From:` address of notification emails.
    #[serde(default = "default_sender_address")]
    pub sender_address: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            consumer_group: default_consumer_group(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            poll_timeout_ms: default_poll_timeout_ms(),
            sender_address: default_sender_address(),
        }
    }
}

impl NotifierConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topic.trim().is_empty() {
            return Err(ConfigError::invalid("notifier.topic", "must not be empty"));
        }
        if self.consumer_group.trim().is_empty() {
            return Err(ConfigError::invalid(
                "notifier.consumer_group",
                "must not be empty",
            ));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "notifier.lookup_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.poll_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "notifier.poll_timeout_ms",
                "must be greater than zero",
            ));
        }
        if !self.sender_address.contains('@') {
            return Err(ConfigError::invalid(
                "notifier.sender_address",
                format!("`{}` is not an email address", self.sender_address),
            ));
        }
        Ok(())
    }
}

fn default_topic() -> String {
    crate::notify::BOOK_ADDED_TOPIC.to_string()
}
fn default_consumer_group() -> String {
    "notification-dispatcher".to_string()
}
fn default_lookup_timeout_ms() -> u64 {
    500
}
fn default_poll_timeout_ms() -> u64 {
    100
}
fn default_sender_address() -> String {
    "no-reply@library.local".to_string()
}
