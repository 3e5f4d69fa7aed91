//! PeerChat Client Runtime
//!
//! Wires the engine core together for one client session:
//! - `ClientRuntime`: execution context + dispatcher + peer model
//! - `RuntimeConfig`: layered configuration loading
//! - `logging`: tracing subscriber setup

pub mod client;
pub mod config;
pub mod error;
pub mod logging;

pub use client::ClientRuntime;
pub use config::{LoggingConfig, RuntimeConfig};
pub use error::{ConfigError, Result, RuntimeError};

// Re-export core types for convenience
pub use peerchat_core::{
    CommandId, ConnectToPeerContent, EngineConfig, EngineError, ExecutionArgs, ExecutionContext,
    Frame, PeerModel, PeerState, PeerTable, SubmissionMode, UserInfo,
};
