//! Error types for the PeerChat engine core
//!
//! Each concern gets its own error enum; `EngineError` unifies them so that
//! callers which do not care about the distinction can use a single `Result`.
//!
//! Malformed input (`ProtocolError`) and unknown commands (`DispatchError`)
//! always surface synchronously to whoever invoked dispatch. Panics raised by
//! submitted work are contained by the execution context and reported as
//! `ExecutionError::Fault`.

use crate::types::CommandId;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Payload or frame did not satisfy the wire schema
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },
    #[error("Frame too large: {actual} bytes (max {max})")]
    FrameTooLarge { max: usize, actual: usize },
    #[error("Required field missing: {field}")]
    MissingField { field: &'static str },
    #[error("Invalid address: {length} raw bytes do not form an IPv4 or IPv6 address")]
    InvalidAddress { length: usize },
    #[error("Invalid port: {port}")]
    InvalidPort { port: i32 },
    #[error("Payload decode failed: {0}")]
    Decode(#[from] bincode::Error),
}

/// Frame could not be routed to a command
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown command id {id}")]
    UnknownCommand { id: CommandId },
}

/// Command registry could not be built
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Command id {id} registered twice ({existing} and {rejected})")]
    DuplicateCommandId {
        id: CommandId,
        existing: &'static str,
        rejected: &'static str,
    },
}

/// Model collaborator refused an operation
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid nickname: {nickname:?}")]
    InvalidNickname { nickname: String },
    #[error("Connection to {nickname} refused: {reason}")]
    ConnectionRefused { nickname: String, reason: String },
}

/// A decoded command failed while running
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Submitted work could not be executed to completion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Work item panicked: {message}")]
    Fault { message: String },
    #[error("Blocking submission from the context's own worker")]
    Reentrant,
    #[error("No worker available: {reason}")]
    WorkerUnavailable { reason: String },
    #[error("Work item dropped before completion")]
    Abandoned,
}

// ----------------------------------------------------------------------------
// Unified Error Type
// ----------------------------------------------------------------------------

/// Core error type for the PeerChat engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },
}

impl From<ModelError> for EngineError {
    fn from(err: ModelError) -> Self {
        EngineError::Command(CommandError::Model(err))
    }
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl EngineError {
    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        EngineError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create an unknown command error
    pub fn unknown_command(id: CommandId) -> Self {
        EngineError::Dispatch(DispatchError::UnknownCommand { id })
    }

    /// True for errors caused by the remote side sending bad input
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, EngineError::Protocol(_) | EngineError::Dispatch(_))
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, EngineError>;
