//! Commands
//!
//! A command is identified on the wire by a numeric [`CommandId`]. It decodes
//! its own payload and then runs against the peer model:
//!
//! - `frame`: splitting raw frames into id + payload and building them
//! - `registry`: id → command table, validated for uniqueness at startup
//! - `dispatcher`: frame → registry lookup → decode → run, inline or through
//!   an execution context
//! - `connect_to_peer`: the Connect-To-Peer command
//!
//! Decoding always happens on the dispatching thread, so malformed frames are
//! reported to the dispatcher's caller and never reach an execution context.

pub mod connect_to_peer;
pub mod dispatcher;
pub mod frame;
pub mod registry;

pub use connect_to_peer::{ConnectToPeerCommand, ConnectToPeerContent, ConnectToPeerRequest};
pub use dispatcher::Dispatcher;
pub use frame::Frame;
pub use registry::CommandRegistry;

use std::sync::Arc;

use crate::errors::{CommandError, ProtocolError};
use crate::model::PeerModel;
use crate::types::{CommandId, ExecutionArgs};

// ----------------------------------------------------------------------------
// Command Trait
// ----------------------------------------------------------------------------

/// A numerically identified unit of behavior decoded from a wire payload
pub trait Command: Send + Sync + 'static {
    /// Decoded and validated payload
    type Content: Send + 'static;

    /// Stable protocol id; unique within a registry
    fn id(&self) -> CommandId;

    /// Human readable name used in logs and registry errors
    fn name(&self) -> &'static str;

    /// Decode the payload, rejecting missing or malformed fields
    fn decode(&self, payload: &[u8]) -> Result<Self::Content, ProtocolError>;

    /// Execute against the model
    fn run(
        &self,
        content: Self::Content,
        model: &dyn PeerModel,
        args: &ExecutionArgs,
    ) -> Result<(), CommandError>;
}

// ----------------------------------------------------------------------------
// Prepared Command
// ----------------------------------------------------------------------------

type RunFn =
    Box<dyn FnOnce(&dyn PeerModel, &ExecutionArgs) -> Result<(), CommandError> + Send + 'static>;

/// A command whose payload has been decoded and is ready to run
pub struct PreparedCommand {
    id: CommandId,
    name: &'static str,
    run: RunFn,
}

impl PreparedCommand {
    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the command's execution routine
    pub fn execute(self, model: &dyn PeerModel, args: &ExecutionArgs) -> Result<(), CommandError> {
        (self.run)(model, args)
    }
}

impl core::fmt::Debug for PreparedCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PreparedCommand")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Type Erasure
// ----------------------------------------------------------------------------

/// Object-safe view of a [`Command`] stored in the registry
pub(crate) trait ErasedCommand: Send + Sync {
    fn command_id(&self) -> CommandId;
    fn command_name(&self) -> &'static str;
    fn prepare(self: Arc<Self>, payload: &[u8]) -> Result<PreparedCommand, ProtocolError>;
}

impl<C: Command> ErasedCommand for C {
    fn command_id(&self) -> CommandId {
        Command::id(self)
    }

    fn command_name(&self) -> &'static str {
        Command::name(self)
    }

    fn prepare(self: Arc<Self>, payload: &[u8]) -> Result<PreparedCommand, ProtocolError> {
        let content = self.decode(payload)?;
        let id = Command::id(&*self);
        let name = Command::name(&*self);
        Ok(PreparedCommand {
            id,
            name,
            run: Box::new(move |model: &dyn PeerModel, args: &ExecutionArgs| {
                self.run(content, model, args)
            }),
        })
    }
}
