//! Message codec for the TCP hop
//!
//! Each JSON document is preceded by a 4-byte big-endian length. The decoder
//! only deserializes once a whole frame has arrived, so a payload split across
//! several TCP segments is reassembled before parsing.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::messages::{CommandEnvelope, CommandResult};

/// Hard upper bound for a single frame (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Length prefix size in bytes
const HEADER_LEN: usize = 4;

/// Protocol codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Codec for CommandEnvelope (encoding) and CommandResult (decoding)
/// Used by the relay client
#[derive(Debug, Clone)]
pub struct ClientCodec {
    max_size: usize,
}

impl ClientCodec {
    pub fn new() -> Self {
        Self {
            max_size: MAX_MESSAGE_SIZE,
        }
    }

    /// Limit frames to `max_size` bytes (clamped to [`MAX_MESSAGE_SIZE`])
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size: max_size.min(MAX_MESSAGE_SIZE),
        }
    }
}

impl Default for ClientCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ClientCodec {
    type Item = CommandResult;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_message(src, self.max_size)
    }
}

impl Encoder<CommandEnvelope> for ClientCodec {
    type Error = CodecError;

    fn encode(&mut self, item: CommandEnvelope, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_message(&item, dst, self.max_size)
    }
}

/// Codec for CommandResult (encoding) and CommandEnvelope (decoding)
/// Used by the socket command server
#[derive(Debug, Clone)]
pub struct ServerCodec {
    max_size: usize,
}

impl ServerCodec {
    pub fn new() -> Self {
        Self {
            max_size: MAX_MESSAGE_SIZE,
        }
    }

    /// Limit frames to `max_size` bytes (clamped to [`MAX_MESSAGE_SIZE`])
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size: max_size.min(MAX_MESSAGE_SIZE),
        }
    }
}

impl Default for ServerCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ServerCodec {
    type Item = CommandEnvelope;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_message(src, self.max_size)
    }
}

impl Encoder<CommandResult> for ServerCodec {
    type Error = CodecError;

    fn encode(&mut self, item: CommandResult, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_message(&item, dst, self.max_size)
    }
}

/// Decode a length-prefixed JSON message
fn decode_message<T: serde::de::DeserializeOwned>(
    src: &mut BytesMut,
    max_size: usize,
) -> Result<Option<T>, CodecError> {
    if src.len() < HEADER_LEN {
        return Ok(None);
    }

    // Peek at length without consuming
    let len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

    if len > max_size {
        return Err(CodecError::MessageTooLarge {
            size: len,
            max: max_size,
        });
    }

    if src.len() < HEADER_LEN + len {
        src.reserve(HEADER_LEN + len - src.len());
        return Ok(None);
    }

    src.advance(HEADER_LEN);
    let data = src.split_to(len);

    let msg: T = serde_json::from_slice(&data)?;
    Ok(Some(msg))
}

/// Encode a length-prefixed JSON message
fn encode_message<T: serde::Serialize>(
    item: &T,
    dst: &mut BytesMut,
    max_size: usize,
) -> Result<(), CodecError> {
    let data = serde_json::to_vec(item)?;

    if data.len() > max_size {
        return Err(CodecError::MessageTooLarge {
            size: data.len(),
            max: max_size,
        });
    }

    dst.reserve(HEADER_LEN + data.len());
    dst.put_u32(data.len() as u32);
    dst.put_slice(&data);
    Ok(())
}
