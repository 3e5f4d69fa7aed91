//! Shared helpers for the peerchat-core integration tests

#![allow(dead_code)]

use peerchat_core::{
    Command, CommandError, CommandId, ConnectToPeerContent, ExecutionArgs, ExecutionContext,
    Frame, ModelError, PeerModel, ProtocolError, UserInfo,
};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Recording Peer Model
// ----------------------------------------------------------------------------

/// Peer model that records every call instead of connecting
#[derive(Debug, Default)]
pub struct RecordingPeerModel {
    calls: Mutex<Vec<(String, SocketAddr)>>,
    refuse: bool,
}

impl RecordingPeerModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model that records calls and then refuses them
    pub fn refusing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            refuse: true,
        }
    }

    pub fn calls(&self) -> Vec<(String, SocketAddr)> {
        self.calls.lock().unwrap().clone()
    }
}

impl PeerModel for RecordingPeerModel {
    fn connect_to_peer(&self, nickname: &str, endpoint: SocketAddr) -> Result<(), ModelError> {
        self.calls
            .lock()
            .unwrap()
            .push((nickname.to_string(), endpoint));
        if self.refuse {
            return Err(ModelError::ConnectionRefused {
                nickname: nickname.to_string(),
                reason: "test refusal".to_string(),
            });
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Test Commands
// ----------------------------------------------------------------------------

/// Command whose run routine always panics
pub struct PanickingCommand;

pub const PANICKING_COMMAND_ID: CommandId = CommandId::new(0x7fff_0001);

impl Command for PanickingCommand {
    type Content = String;

    fn id(&self) -> CommandId {
        PANICKING_COMMAND_ID
    }

    fn name(&self) -> &'static str {
        "Panicking"
    }

    fn decode(&self, payload: &[u8]) -> Result<String, ProtocolError> {
        peerchat_core::codec::decode(payload)
    }

    fn run(&self, content: String, _: &dyn PeerModel, _: &ExecutionArgs) -> Result<(), CommandError> {
        panic!("{}", content)
    }
}

// ----------------------------------------------------------------------------
// Frame Helpers
// ----------------------------------------------------------------------------

pub fn args() -> ExecutionArgs {
    ExecutionArgs::new(Uuid::new_v4())
}

pub fn connect_frame(nickname: &str, endpoint: &str) -> Vec<u8> {
    let endpoint: SocketAddr = endpoint.parse().unwrap();
    Frame::encode(
        CommandId::CONNECT_TO_PEER,
        &ConnectToPeerContent::new(UserInfo::new(nickname), endpoint),
    )
    .unwrap()
}

pub fn anonymous_connect_frame() -> Vec<u8> {
    Frame::encode(
        CommandId::CONNECT_TO_PEER,
        &ConnectToPeerContent {
            port: 5000,
            ip_address: vec![127, 0, 0, 1],
            remote_info: None,
        },
    )
    .unwrap()
}

/// Poll until the context's worker has exited
pub fn wait_until_idle(ctx: &ExecutionContext) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while ctx.is_busy() {
        assert!(Instant::now() < deadline, "context never went idle");
        thread::sleep(Duration::from_millis(1));
    }
}
