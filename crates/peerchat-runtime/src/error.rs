//! Error handling for the PeerChat runtime

use thiserror::Error;

/// Configuration could not be loaded or is inconsistent
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Loading(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Runtime-level error types
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Engine error: {0}")]
    Engine(#[from] peerchat_core::EngineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<peerchat_core::ExecutionError> for RuntimeError {
    fn from(err: peerchat_core::ExecutionError) -> Self {
        RuntimeError::Engine(err.into())
    }
}

impl From<peerchat_core::RegistryError> for RuntimeError {
    fn from(err: peerchat_core::RegistryError) -> Self {
        RuntimeError::Engine(err.into())
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
