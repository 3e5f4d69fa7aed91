//! Connect-To-Peer command
//!
//! Sent by the server when two clients should talk directly: the payload names
//! the remote user and the address/port it is listening on.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Command;
use crate::codec;
use crate::errors::{CommandError, ProtocolError};
use crate::model::PeerModel;
use crate::types::{CommandId, ExecutionArgs, UserInfo};

/// Wire payload of Connect-To-Peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectToPeerContent {
    pub port: i32,
    /// Raw address bytes; 4 for IPv4, 16 for IPv6
    pub ip_address: Vec<u8>,
    pub remote_info: Option<UserInfo>,
}

impl ConnectToPeerContent {
    /// Payload pointing at `endpoint` for `remote`
    pub fn new(remote: UserInfo, endpoint: SocketAddr) -> Self {
        let ip_address = match endpoint.ip() {
            IpAddr::V4(ip) => ip.octets().to_vec(),
            IpAddr::V6(ip) => ip.octets().to_vec(),
        };
        Self {
            port: i32::from(endpoint.port()),
            ip_address,
            remote_info: Some(remote),
        }
    }

    /// Validate into a request the model can act on
    pub fn into_request(self) -> Result<ConnectToPeerRequest, ProtocolError> {
        let remote = self.remote_info.ok_or(ProtocolError::MissingField {
            field: "remote_info",
        })?;
        let ip = parse_ip(&self.ip_address)?;
        let port =
            u16::try_from(self.port).map_err(|_| ProtocolError::InvalidPort { port: self.port })?;

        Ok(ConnectToPeerRequest {
            nickname: remote.nickname,
            endpoint: SocketAddr::new(ip, port),
        })
    }
}

fn parse_ip(bytes: &[u8]) -> Result<IpAddr, ProtocolError> {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        return Ok(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        return Ok(IpAddr::V6(Ipv6Addr::from(octets)));
    }
    Err(ProtocolError::InvalidAddress {
        length: bytes.len(),
    })
}

/// Validated Connect-To-Peer payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectToPeerRequest {
    pub nickname: String,
    pub endpoint: SocketAddr,
}

/// Asks the peer model to open a direct connection to a remote user
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectToPeerCommand;

impl Command for ConnectToPeerCommand {
    type Content = ConnectToPeerRequest;

    fn id(&self) -> CommandId {
        CommandId::CONNECT_TO_PEER
    }

    fn name(&self) -> &'static str {
        "ConnectToPeer"
    }

    fn decode(&self, payload: &[u8]) -> Result<ConnectToPeerRequest, ProtocolError> {
        codec::decode::<ConnectToPeerContent>(payload)?.into_request()
    }

    fn run(
        &self,
        content: ConnectToPeerRequest,
        model: &dyn PeerModel,
        args: &ExecutionArgs,
    ) -> Result<(), CommandError> {
        debug!(
            session = %args.session_id,
            peer = %content.nickname,
            endpoint = %content.endpoint,
            "Handling ConnectToPeer"
        );
        model.connect_to_peer(&content.nickname, content.endpoint)?;
        Ok(())
    }
}
