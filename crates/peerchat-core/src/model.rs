//! Peer model collaborator
//!
//! Commands never touch sockets themselves; they ask a `PeerModel` to do it.
//! `PeerTable` is the in-memory implementation used by the client runtime: it
//! records outbound connection attempts keyed by nickname so the networking
//! layer can pick them up.

use std::net::SocketAddr;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::errors::ModelError;

/// Shared client-side state that commands mutate
pub trait PeerModel: Send + Sync {
    /// Start an outbound connection attempt to `endpoint` for `nickname`
    fn connect_to_peer(&self, nickname: &str, endpoint: SocketAddr) -> Result<(), ModelError>;
}

// ----------------------------------------------------------------------------
// Peer Table
// ----------------------------------------------------------------------------

/// Lifecycle of a direct peer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Connecting,
    Connected,
}

/// One row of the peer table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConnection {
    pub nickname: String,
    pub endpoint: SocketAddr,
    pub state: PeerState,
    /// Connection attempts requested for this nickname so far
    pub attempts: u32,
}

/// Concurrent nickname → connection table
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: DashMap<String, PeerConnection>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the row for `nickname`
    pub fn get(&self, nickname: &str) -> Option<PeerConnection> {
        self.peers.get(nickname).map(|entry| entry.value().clone())
    }

    /// Record that the transport finished the handshake with `nickname`
    pub fn mark_connected(&self, nickname: &str) -> bool {
        match self.peers.get_mut(nickname) {
            Some(mut entry) => {
                entry.state = PeerState::Connected;
                info!(peer = nickname, endpoint = %entry.endpoint, "Peer connected");
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, nickname: &str) -> Option<PeerConnection> {
        self.peers.remove(nickname).map(|(_, connection)| connection)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl PeerModel for PeerTable {
    fn connect_to_peer(&self, nickname: &str, endpoint: SocketAddr) -> Result<(), ModelError> {
        if nickname.trim().is_empty() {
            return Err(ModelError::InvalidNickname {
                nickname: nickname.to_string(),
            });
        }
        if endpoint.ip().is_unspecified() || endpoint.port() == 0 {
            return Err(ModelError::ConnectionRefused {
                nickname: nickname.to_string(),
                reason: format!("unroutable endpoint {endpoint}"),
            });
        }

        let mut entry = self
            .peers
            .entry(nickname.to_string())
            .or_insert_with(|| PeerConnection {
                nickname: nickname.to_string(),
                endpoint,
                state: PeerState::Connecting,
                attempts: 0,
            });

        entry.endpoint = endpoint;
        entry.state = PeerState::Connecting;
        entry.attempts = entry.attempts.saturating_add(1);

        debug!(
            peer = nickname,
            %endpoint,
            attempt = entry.attempts,
            "Connecting to peer"
        );
        Ok(())
    }
}
