use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Read-side cache settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// TTL of the `categories` and `books:new` snapshots. Nothing invalidates
    /// them earlier, so this is also the staleness bound.
    #[serde(default = "default_collection_ttl_secs")]
    pub collection_ttl_secs: u64,

    /// How many books the `books:new` snapshot holds.
    #[serde(default = "default_new_books_limit")]
    pub new_books_limit: usize,

    /// How many entries `popular_books` returns.
    #[serde(default = "default_popular_limit")]
    pub popular_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            collection_ttl_secs: default_collection_ttl_secs(),
            new_books_limit: default_new_books_limit(),
            popular_limit: default_popular_limit(),
        }
    }
}

impl CacheConfig {
    pub fn collection_ttl(&self) -> Duration {
        Duration::from_secs(self.collection_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_ttl_secs == 0 {
            return Err(ConfigError::invalid(
                "cache.collection_ttl_secs",
                "must be greater than zero",
            ));
        }
        if self.new_books_limit == 0 {
            return Err(ConfigError::invalid(
                "cache.new_books_limit",
                "must be greater than zero",
            ));
        }
        if self.popular_limit == 0 {
            return Err(ConfigError::invalid(
                "cache.popular_limit",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_collection_ttl_secs() -> u64 {
    15 * 60
}
fn default_new_books_limit() -> usize {
    10
}
fn default_popular_limit() -> usize {
    10
}
