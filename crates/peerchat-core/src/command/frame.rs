//! Wire frames
//!
//! ```text
//! frame := command_id: i64 (little-endian) || payload bytes
//! ```

use serde::Serialize;

use crate::codec;
use crate::config::MIN_FRAME_SIZE;
use crate::errors::ProtocolError;
use crate::types::CommandId;

/// A frame split into its command id and borrowed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub command_id: CommandId,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Split `bytes` into header and payload
    pub fn parse(bytes: &'a [u8], max_size: usize) -> Result<Self, ProtocolError> {
        if bytes.len() < MIN_FRAME_SIZE {
            return Err(ProtocolError::FrameTooShort {
                expected: MIN_FRAME_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes.len() > max_size {
            return Err(ProtocolError::FrameTooLarge {
                max: max_size,
                actual: bytes.len(),
            });
        }

        let (header, payload) = bytes.split_at(MIN_FRAME_SIZE);
        let mut raw = [0u8; MIN_FRAME_SIZE];
        raw.copy_from_slice(header);

        Ok(Self {
            command_id: CommandId::new(i64::from_le_bytes(raw)),
            payload,
        })
    }

    /// Build a frame from a command id and a payload
    pub fn encode<T: Serialize>(command_id: CommandId, payload: &T) -> Result<Vec<u8>, ProtocolError> {
        let body = codec::encode(payload)?;
        let mut frame = Vec::with_capacity(MIN_FRAME_SIZE + body.len());
        frame.extend_from_slice(&command_id.value().to_le_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}
