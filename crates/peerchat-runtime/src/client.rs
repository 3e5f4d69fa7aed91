//! Client runtime
//!
//! Owns one session's execution context and dispatcher and routes inbound
//! frames through them. Every model mutation triggered by a frame runs on the
//! session's context, so frames from the server connection and from direct
//! peer connections are applied in arrival order.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use peerchat_core::{
    CommandRegistry, Dispatcher, EngineConfig, ExecutionArgs, ExecutionContext, PeerModel,
    PeerTable, SubmissionMode,
};

use crate::error::Result;

/// One client session: execution context + dispatcher + peer model
pub struct ClientRuntime {
    session_id: Uuid,
    context: ExecutionContext,
    dispatcher: Dispatcher,
    default_mode: SubmissionMode,
}

impl ClientRuntime {
    /// Build a runtime over `model` with the standard command set
    ///
    /// A `TokioBlocking` worker kind requires being called inside a tokio runtime.
    pub fn new(config: &EngineConfig, model: Arc<dyn PeerModel>) -> Result<Self> {
        Self::with_registry(config, model, CommandRegistry::standard()?)
    }

    /// Build a runtime with a caller-supplied registry
    pub fn with_registry(
        config: &EngineConfig,
        model: Arc<dyn PeerModel>,
        registry: CommandRegistry,
    ) -> Result<Self> {
        config.validate()?;

        let session_id = Uuid::new_v4();
        let context = ExecutionContext::from_config(format!("session-{session_id}"), &config.execution)?;
        let dispatcher = Dispatcher::with_config(registry, model, &config.dispatch);

        info!(
            session = %session_id,
            commands = dispatcher.registry().len(),
            worker_kind = ?config.execution.worker_kind,
            "Client runtime created"
        );

        Ok(Self {
            session_id,
            context,
            dispatcher,
            default_mode: config.dispatch.default_mode,
        })
    }

    /// Runtime over a fresh in-memory peer table, returned alongside it
    pub fn with_peer_table(config: &EngineConfig) -> Result<(Self, Arc<PeerTable>)> {
        let table = Arc::new(PeerTable::new());
        let runtime = Self::new(config, table.clone())?;
        Ok((runtime, table))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The session's execution context, for work that must be ordered with frames
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Route a frame from the server (`remote_peer = None`) or a direct peer
    pub fn handle_frame(&self, frame: &[u8], remote_peer: Option<&str>) -> Result<()> {
        let args = self.args_for(remote_peer);
        self.handle_frame_with(frame, args, self.default_mode)
    }

    fn args_for(&self, remote_peer: Option<&str>) -> ExecutionArgs {
        match remote_peer {
            Some(peer) => ExecutionArgs::from_peer(self.session_id, peer),
            None => ExecutionArgs::new(self.session_id),
        }
    }

    /// Route a frame from inside a tokio runtime and await its outcome
    ///
    /// Always waits for the command to run, whatever the configured mode;
    /// this is the entry point for `TokioBlocking` sessions that need the
    /// result of a frame.
    pub async fn handle_frame_async(&self, frame: &[u8], remote_peer: Option<&str>) -> Result<()> {
        let args = self.args_for(remote_peer);
        debug!(session = %self.session_id, len = frame.len(), "Handling frame (awaited)");
        self.dispatcher
            .dispatch_await(&self.context, frame, args)
            .await?;
        Ok(())
    }

    /// Route a frame with explicit args and submission mode
    pub fn handle_frame_with(
        &self,
        frame: &[u8],
        args: ExecutionArgs,
        mode: SubmissionMode,
    ) -> Result<()> {
        debug!(session = %self.session_id, len = frame.len(), %mode, "Handling frame");
        match mode {
            SubmissionMode::Async => self.dispatcher.dispatch_async(&self.context, frame, args)?,
            SubmissionMode::Blocking => {
                self.dispatcher.dispatch_blocking(&self.context, frame, args)?
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for ClientRuntime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientRuntime")
            .field("session_id", &self.session_id)
            .field("context", &self.context)
            .field("default_mode", &self.default_mode)
            .finish()
    }
}
