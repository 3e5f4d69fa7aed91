//! Command dispatcher
//!
//! Turns raw frames into executed commands. Lookup and decode always run on
//! the caller's thread; only the command's run routine is handed to an
//! execution context when one is used.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{CommandRegistry, ErasedCommand, Frame, PreparedCommand};
use crate::config::DispatchConfig;
use crate::errors::{EngineError, Result};
use crate::execution::ExecutionContext;
use crate::model::PeerModel;
use crate::types::ExecutionArgs;

/// Routes frames to registered commands and runs them against a model
pub struct Dispatcher {
    registry: CommandRegistry,
    model: Arc<dyn PeerModel>,
    max_frame_size: usize,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, model: Arc<dyn PeerModel>) -> Self {
        Self::with_config(registry, model, &DispatchConfig::default())
    }

    pub fn with_config(
        registry: CommandRegistry,
        model: Arc<dyn PeerModel>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            registry,
            model,
            max_frame_size: config.max_frame_size,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Parse, look up and decode a frame without running it
    pub fn prepare(&self, frame: &[u8]) -> Result<PreparedCommand> {
        let frame = Frame::parse(frame, self.max_frame_size)?;
        let command = self
            .registry
            .get(frame.command_id)
            .ok_or_else(|| EngineError::unknown_command(frame.command_id))?;
        Ok(command.prepare(frame.payload)?)
    }

    /// Decode and run on the calling thread
    pub fn dispatch(&self, frame: &[u8], args: &ExecutionArgs) -> Result<()> {
        let prepared = self.prepare(frame).inspect_err(log_rejected)?;
        debug!(command = prepared.name(), id = %prepared.id(), "Dispatching inline");
        prepared.execute(self.model.as_ref(), args)?;
        Ok(())
    }

    /// Decode now, run later on `context` without waiting
    ///
    /// Failures of the run routine are logged by the worker; only decode and
    /// lookup errors reach the caller.
    pub fn dispatch_async(
        &self,
        context: &ExecutionContext,
        frame: &[u8],
        args: ExecutionArgs,
    ) -> Result<()> {
        let prepared = self.prepare(frame).inspect_err(log_rejected)?;
        let model = Arc::clone(&self.model);

        context.submit_async(move || {
            let (name, id) = (prepared.name(), prepared.id());
            if let Err(err) = prepared.execute(model.as_ref(), &args) {
                warn!(command = name, %id, error = %err, "Command failed");
            }
        })?;
        Ok(())
    }

    /// Decode now, run on `context` and wait for the outcome
    pub fn dispatch_blocking(
        &self,
        context: &ExecutionContext,
        frame: &[u8],
        args: ExecutionArgs,
    ) -> Result<()> {
        let prepared = self.prepare(frame).inspect_err(log_rejected)?;
        let model = Arc::clone(&self.model);

        context.submit_blocking(move || prepared.execute(model.as_ref(), &args))??;
        Ok(())
    }

    /// Decode now, run on `context` and await the outcome
    ///
    /// For callers inside a tokio runtime, where parking the thread is not
    /// allowed.
    pub async fn dispatch_await(
        &self,
        context: &ExecutionContext,
        frame: &[u8],
        args: ExecutionArgs,
    ) -> Result<()> {
        let prepared = self.prepare(frame).inspect_err(log_rejected)?;
        let model = Arc::clone(&self.model);

        context
            .submit(move || prepared.execute(model.as_ref(), &args))
            .await??;
        Ok(())
    }
}

fn log_rejected(err: &EngineError) {
    warn!(error = %err, "Rejected frame");
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("max_frame_size", &self.max_frame_size)
            .finish()
    }
}
