//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{Result, RuntimeError};

/// Install the global fmt subscriber
///
/// `RUST_LOG` takes precedence over the configured filter. Fails if a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| RuntimeError::Logging(e.to_string()))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_thread_names(config.with_thread_names)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| RuntimeError::Logging(e.to_string()))
}
