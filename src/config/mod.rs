//! Configuration for the catalog read layer and the notification pipeline.
//!
//! Sources are merged in this order (later sources win):
//! 1. Type defaults
//! 2. TOML file named by `LIBRARY_CONFIG_PATH` (if set)
//! 3. Environment variables with the `LIBRARY__` prefix, e.g.
//!    `LIBRARY__NOTIFIER__LOOKUP_TIMEOUT_MS=250`
//!
//! Loading never validates; call [`LibraryConfig::validate`] once all
//! overrides are applied.

mod cache;
mod error;
mod notifier;
mod pool;

pub use cache::CacheConfig;
pub use error::ConfigError;
pub use notifier::NotifierConfig;
pub use pool::PoolConfig;


use std::env;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "LIBRARY_CONFIG_PATH";
const ENV_PREFIX: &str = "LIBRARY";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LibraryConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Email delivery workers.
    #[serde(default = "PoolConfig::email_default")]
    pub workers: PoolConfig,
    /// Cache repopulation workers.
    #[serde(default = "PoolConfig::background_default")]
    pub background: PoolConfig,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            notifier: NotifierConfig::default(),
            workers: PoolConfig::email_default(),
            background: PoolConfig::background_default(),
        }
    }
}

impl LibraryConfig {
    /// Loads defaults, the optional file from `LIBRARY_CONFIG_PATH` and the
    /// environment. Does not validate.
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Layers another file over the current values, then the environment
    /// again so it keeps the highest priority. Does not validate.
    pub fn with_override_config(&self, path: &str) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        self.cache.validate()?;
        self.notifier.validate()?;
        self.workers.validate("workers")?;
        self.background.validate("background")?;
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
