//! Engine Configuration
//!
//! Plain serde structs with defaults and named presets. Loading from files and
//! the environment is the runtime crate's job.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};
use crate::types::SubmissionMode;

/// Frames are never smaller than their 8-byte command id header
pub const MIN_FRAME_SIZE: usize = 8;

// ----------------------------------------------------------------------------
// Execution Configuration
// ----------------------------------------------------------------------------

/// Where an execution context draws its transient workers from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    /// A fresh OS thread per drain cycle
    Thread,
    /// The blocking pool of the current tokio runtime
    TokioBlocking,
}

/// Configuration for execution contexts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Worker source
    pub worker_kind: WorkerKind,
    /// Name given to spawned worker threads
    pub thread_name: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            worker_kind: WorkerKind::Thread,
            thread_name: "peerchat-exec".to_string(),
        }
    }
}

impl ExecutionConfig {
    /// Draw workers from the surrounding tokio runtime
    pub fn tokio() -> Self {
        Self {
            worker_kind: WorkerKind::TokioBlocking,
            ..Self::default()
        }
    }
}

// ----------------------------------------------------------------------------
// Dispatch Configuration
// ----------------------------------------------------------------------------

/// Configuration for frame dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Largest accepted frame, header included
    pub max_frame_size: usize,
    /// Mode used by the runtime when routing inbound frames through the context
    pub default_mode: SubmissionMode,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 1024 * 1024, // 1MB
            default_mode: SubmissionMode::Async,
        }
    }
}

impl DispatchConfig {
    /// Blocking dispatch so tests observe effects as soon as dispatch returns
    pub fn testing() -> Self {
        Self {
            max_frame_size: 1024 * 1024,
            default_mode: SubmissionMode::Blocking,
        }
    }
}

// ----------------------------------------------------------------------------
// Engine Configuration
// ----------------------------------------------------------------------------

/// Complete configuration of the engine core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub execution: ExecutionConfig,
    pub dispatch: DispatchConfig,
}

impl EngineConfig {
    /// Configuration used by unit and integration tests
    pub fn testing() -> Self {
        Self {
            execution: ExecutionConfig::default(),
            dispatch: DispatchConfig::testing(),
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.max_frame_size < MIN_FRAME_SIZE {
            return Err(EngineError::config_error(format!(
                "max_frame_size must be at least {} bytes",
                MIN_FRAME_SIZE
            )));
        }
        if self.execution.thread_name.trim().is_empty() {
            return Err(EngineError::config_error("thread_name must not be empty"));
        }
        // Parking a runtime thread on its own blocking pool is not allowed;
        // tokio callers wait with the async entry points instead.
        if self.execution.worker_kind == WorkerKind::TokioBlocking
            && self.dispatch.default_mode == SubmissionMode::Blocking
        {
            return Err(EngineError::config_error(
                "default_mode = blocking cannot be combined with worker_kind = tokio_blocking",
            ));
        }
        Ok(())
    }
}
