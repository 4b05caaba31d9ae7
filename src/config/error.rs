//! Error type for configuration loading and validation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or did not deserialize into `LibraryConfig`.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was loaded but is out of range.
    #[error("invalid configuration for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
