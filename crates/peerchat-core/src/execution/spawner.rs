//! Worker spawners
//!
//! An execution context never keeps a thread of its own. Every time its queue
//! goes from empty to non-empty it asks a spawner for one transient worker,
//! which exits again once the queue drains.

use std::sync::Arc;
use std::thread;

use tokio::runtime::Handle;

use crate::config::{ExecutionConfig, WorkerKind};
use crate::errors::ExecutionError;

/// Body of a worker; runs until the owning queue is drained
pub type WorkerJob = Box<dyn FnOnce() + Send + 'static>;

/// Source of transient workers
pub trait WorkerSpawner: Send + Sync {
    /// Start `job` on a worker other than the caller
    fn spawn_worker(&self, job: WorkerJob) -> Result<(), ExecutionError>;
}

// ----------------------------------------------------------------------------
// OS Thread Spawner
// ----------------------------------------------------------------------------

/// Spawns a named OS thread per drain cycle
#[derive(Debug, Clone)]
pub struct ThreadSpawner {
    name: String,
}

impl ThreadSpawner {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self::new(ExecutionConfig::default().thread_name)
    }
}

impl WorkerSpawner for ThreadSpawner {
    fn spawn_worker(&self, job: WorkerJob) -> Result<(), ExecutionError> {
        thread::Builder::new()
            .name(self.name.clone())
            .spawn(job)
            .map(|_| ())
            .map_err(|e| ExecutionError::WorkerUnavailable {
                reason: e.to_string(),
            })
    }
}

// ----------------------------------------------------------------------------
// Tokio Blocking Pool Spawner
// ----------------------------------------------------------------------------

/// Draws workers from a tokio runtime's blocking pool
#[derive(Debug, Clone)]
pub struct TokioBlockingSpawner {
    handle: Handle,
}

impl TokioBlockingSpawner {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running inside
    pub fn current() -> Result<Self, ExecutionError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| ExecutionError::WorkerUnavailable {
                reason: e.to_string(),
            })
    }
}

impl WorkerSpawner for TokioBlockingSpawner {
    fn spawn_worker(&self, job: WorkerJob) -> Result<(), ExecutionError> {
        // Detached; the worker reports through the context, not the join handle.
        drop(self.handle.spawn_blocking(job));
        Ok(())
    }
}

/// Build the spawner selected by `config`
///
/// `WorkerKind::TokioBlocking` requires the caller to be inside a tokio runtime.
pub fn spawner_from_config(
    config: &ExecutionConfig,
) -> Result<Arc<dyn WorkerSpawner>, ExecutionError> {
    match config.worker_kind {
        WorkerKind::Thread => Ok(Arc::new(ThreadSpawner::new(config.thread_name.clone()))),
        WorkerKind::TokioBlocking => Ok(Arc::new(TokioBlockingSpawner::current()?)),
    }
}
