use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::worker_pool::PoolSettings;

/// Size of a fixed worker pool. Used for both the email workers and the
/// background repopulation pool.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_depth: usize,
}

impl PoolConfig {
    pub(super) fn email_default() -> Self {
        Self {
            workers: 4,
            queue_depth: 16,
        }
    }

    pub(super) fn background_default() -> Self {
        Self {
            workers: 1,
            queue_depth: 32,
        }
    }

    pub fn settings(&self) -> PoolSettings {
        PoolSettings {
            workers: self.workers,
            queue_depth: self.queue_depth,
        }
    }

    pub fn validate(&self, section: &'static str) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::invalid(section, "workers must be greater than zero"));
        }
        if self.queue_depth == 0 {
            return Err(ConfigError::invalid(
                section,
                "queue_depth must be greater than zero",
            ));
        }
        Ok(())
    }
}
