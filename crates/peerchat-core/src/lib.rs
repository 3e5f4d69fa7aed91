//! PeerChat Engine Core
//!
//! The command-execution substrate of the PeerChat client engine:
//!
//! - [`execution`]: a serialized execution context running cross-thread work
//!   one item at a time, in submission order, on transient workers
//! - [`command`]: numerically identified commands, their registry and the
//!   dispatcher that decodes wire frames and runs them against the peer model
//! - [`model`]: the peer model collaborator commands act on
//!
//! Transport, UI and the broader identity model live outside this crate.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod codec;
pub mod command;
pub mod config;
pub mod errors;
pub mod execution;
pub mod model;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use command::{
    Command, CommandRegistry, ConnectToPeerCommand, ConnectToPeerContent, ConnectToPeerRequest,
    Dispatcher, Frame, PreparedCommand,
};
pub use config::{DispatchConfig, EngineConfig, ExecutionConfig, WorkerKind};
pub use errors::{
    CommandError, DispatchError, EngineError, ExecutionError, ModelError,
    ProtocolError, RegistryError, Result,
};
pub use execution::{
    ContextStats, ExecutionContext, ThreadSpawner, TokioBlockingSpawner, WorkerSpawner,
};
pub use model::{PeerConnection, PeerModel, PeerState, PeerTable};
pub use types::{CommandId, ExecutionArgs, SubmissionMode, UserInfo};
