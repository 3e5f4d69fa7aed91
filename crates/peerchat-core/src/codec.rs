//! Payload codec
//!
//! Thin wrapper over bincode so that every command decodes payloads the same
//! way and decode failures come back as `ProtocolError`.

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::ProtocolError;

/// Decode a typed payload from raw bytes
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Encode a typed payload
pub fn encode<T: Serialize>(payload: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(bincode::serialize(payload)?)
}
