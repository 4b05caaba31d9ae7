//! Error type for cache backends.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The key holds a different kind of value than the operation expects.
    #[error("key `{key}` does not hold a {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("cache lock poisoned during {0}")]
    LockPoisoned(&'static str),

    /// The backend could not be reached or refused the command.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// A cached value could not be encoded or decoded.
    #[error("cache codec error: {0}")]
    Codec(String),
}

impl CacheError {
    pub(crate) fn wrong_type(key: &str, expected: &'static str) -> Self {
        CacheError::WrongType {
            key: key.to_string(),
            expected,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Codec(err.to_string())
    }
}

impl From<bitcode::Error> for CacheError {
    fn from(err: bitcode::Error) -> Self {
        CacheError::Codec(err.to_string())
    }
}
