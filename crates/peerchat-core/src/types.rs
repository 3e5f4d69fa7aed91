//! Core types for the PeerChat engine
//!
//! Newtypes and small records shared between the execution context, the
//! command layer and the model collaborator.

use core::fmt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Command Identifier
// ----------------------------------------------------------------------------

/// Numeric protocol identifier of a command, as carried in the frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommandId(i64);

impl CommandId {
    /// Client asks the local engine to open a direct connection to a peer
    pub const CONNECT_TO_PEER: Self = Self(0x0002_0001);

    /// Create a command id from its raw wire value
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw wire value
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CommandId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

// ----------------------------------------------------------------------------
// Submission Mode
// ----------------------------------------------------------------------------

/// How a work item is submitted to an execution context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// Fire-and-forget; the submitter never observes the outcome
    Async,
    /// The submitter parks until the item has run
    Blocking,
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionMode::Async => write!(f, "async"),
            SubmissionMode::Blocking => write!(f, "blocking"),
        }
    }
}

// ----------------------------------------------------------------------------
// Remote User Info
// ----------------------------------------------------------------------------

/// Identity record of a remote user as sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Display name, also the key of the peer table
    pub nickname: String,
    /// Optional RGB color of the nickname
    pub nick_color: Option<[u8; 3]>,
}

impl UserInfo {
    /// Create a user record with only a nickname
    pub fn new<T: Into<String>>(nickname: T) -> Self {
        Self {
            nickname: nickname.into(),
            nick_color: None,
        }
    }
}

// ----------------------------------------------------------------------------
// Execution Args
// ----------------------------------------------------------------------------

/// Ambient session context handed to every dispatched command
///
/// Supplied by the surrounding client runtime per frame; commands read it but
/// never own it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionArgs {
    /// Logical session the frame belongs to
    pub session_id: Uuid,
    /// Peer connection the frame arrived on, `None` when it came from the server
    pub remote_peer: Option<String>,
}

impl ExecutionArgs {
    /// Args for a frame received from the server connection
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            remote_peer: None,
        }
    }

    /// Args for a frame received over a direct peer connection
    pub fn from_peer<T: Into<String>>(session_id: Uuid, peer: T) -> Self {
        Self {
            session_id,
            remote_peer: Some(peer.into()),
        }
    }
}
