//! PeerChat Runtime Configuration
//!
//! Layered loading with figment, lowest priority first:
//! 1. Default values
//! 2. Configuration file (`peerchat.toml` or an explicit path)
//! 3. Environment variables (`PEERCHAT_*`, nested keys separated by `__`,
//!    e.g. `PEERCHAT_ENGINE__DISPATCH__MAX_FRAME_SIZE=65536`)

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use peerchat_core::EngineConfig;

use crate::error::ConfigError;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "peerchat.toml";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "PEERCHAT_";

// ----------------------------------------------------------------------------
// Logging Configuration
// ----------------------------------------------------------------------------

/// Tracing subscriber options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `peerchat_core=debug,info`; `RUST_LOG` wins when set
    pub filter: String,
    /// Include the event target in each line
    pub with_target: bool,
    /// Include the thread name in each line
    pub with_thread_names: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            with_target: false,
            with_thread_names: true,
        }
    }
}

impl LoggingConfig {
    /// Debug-level logging for investigating ordering problems
    pub fn verbose() -> Self {
        Self {
            filter: "debug".to_string(),
            with_target: true,
            with_thread_names: true,
        }
    }
}

// ----------------------------------------------------------------------------
// Runtime Configuration
// ----------------------------------------------------------------------------

/// Complete configuration of a client runtime
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Engine core settings
    pub engine: EngineConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl RuntimeConfig {
    /// Load from defaults, `peerchat.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::extract(Self::base().merge(Toml::file(DEFAULT_CONFIG_FILE)))
    }

    /// Load from defaults, the given file and the environment
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Loading(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        Self::extract(Self::base().merge(Toml::file(path)))
    }

    fn base() -> Figment {
        Figment::new().merge(Serialized::defaults(Self::default()))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Loading(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check the loaded values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        EnvFilter::try_new(&self.logging.filter).map_err(|e| {
            ConfigError::Validation(format!(
                "invalid log filter {:?}: {}",
                self.logging.filter, e
            ))
        })?;

        Ok(())
    }
}
