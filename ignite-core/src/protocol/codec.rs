//! Length-prefixed framing for the thin client protocol.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::constants::*;
use crate::error::{IgniteError, Result};

/// Codec splitting a byte stream into message bodies.
///
/// Every message, handshake included, is a signed 4-byte little-endian
/// length followed by that many bytes. The decoder yields bodies with the
/// length stripped; the encoder prepends it.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    max_message_size: usize,
}

impl MessageCodec {
    /// Creates a codec with the default size limit.
    pub fn new() -> Self {
        Self::with_max_message_size(MAX_MESSAGE_SIZE)
    }

    /// Creates a codec rejecting messages longer than `max_message_size`.
    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self { max_message_size }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<Bytes> for MessageCodec {
    type Error = IgniteError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        if item.len() > self.max_message_size {
            return Err(IgniteError::Protocol(format!(
                "message of {} bytes exceeds limit of {}",
                item.len(),
                self.max_message_size
            )));
        }
        dst.reserve(SIZE_OF_LENGTH_FIELD + item.len());
        dst.put_i32_le(item.len() as i32);
        dst.put_slice(&item);
        Ok(())
    }
}

impl Decoder for MessageCodec {
    type Item = Bytes;
    type Error = IgniteError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < SIZE_OF_LENGTH_FIELD {
            return Ok(None);
        }

        let length = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        if length < 0 || length as usize > self.max_message_size {
            return Err(IgniteError::Protocol(format!(
                "invalid message length: {}",
                length
            )));
        }

        let total = SIZE_OF_LENGTH_FIELD + length as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(SIZE_OF_LENGTH_FIELD);
        Ok(Some(src.split_to(length as usize).freeze()))
    }
}
