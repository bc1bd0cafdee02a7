//! Length-prefixed JSON framing.
//!
//! A frame is a four-byte big-endian length followed by the JSON body of one
//! [`Message`]. The length counts the header itself, so a frame carrying an
//! `n`-byte body announces `n + 4`.
//!
//! [`encode`] and [`MessageCodec`] are pure and stateless with respect to
//! I/O. [`FrameReader`] and [`write_frame`] drive them over an async
//! transport, handling partial reads and partial writes.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    byte_order::{read_network_u32, write_network_u32},
    message::Message,
};

pub mod error;
mod io;

pub use error::CodecError;
pub use io::{FrameReader, READ_CHUNK_SIZE, write_frame};

/// Size of the length prefix in bytes.
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Default upper bound on a single frame (16 MiB).
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Encode `message` into a complete frame.
///
/// # Errors
///
/// Returns [`CodecError::Serde`] if the message cannot be serialized and
/// [`CodecError::FrameTooLarge`] if the frame would not fit the length field.
///
/// # Examples
///
/// ```
/// use warplink::{Message, codec::encode};
///
/// let frame = encode(&Message::new()).expect("encode");
/// assert_eq!(&frame[..4], &[0, 0, 0, 15]);
/// assert_eq!(&frame[4..], br#"{"Host":""}"#);
/// ```
pub fn encode(message: &Message) -> Result<Bytes, CodecError> {
    let mut dst = BytesMut::new();
    MessageCodec::new(usize::MAX).encode(message, &mut dst)?;
    Ok(dst.freeze())
}

/// Decode a complete frame held in `frame`.
///
/// # Errors
///
/// Returns [`CodecError::ShortFrame`] if the header is incomplete,
/// [`CodecError::Disconnected`] if the body is truncated, and propagates
/// length and body errors from [`MessageCodec`].
pub fn decode(frame: &[u8]) -> Result<Message, CodecError> {
    let mut src = BytesMut::from(frame);
    match MessageCodec::default().decode(&mut src)? {
        Some(message) => Ok(message),
        None if src.len() < LENGTH_HEADER_SIZE => Err(CodecError::ShortFrame { have: src.len() }),
        None => Err(CodecError::Disconnected),
    }
}

/// `tokio_util` codec for the length-prefixed JSON format.
#[derive(Clone, Copy, Debug)]
pub struct MessageCodec {
    max_frame_length: usize,
}

impl MessageCodec {
    /// Create a codec rejecting frames longer than `max_frame_length`.
    ///
    /// Values smaller than the header are raised to the header size.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            max_frame_length: max_frame_length.max(LENGTH_HEADER_SIZE),
        }
    }

    /// Largest frame this codec accepts, header included.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }

    /// Validate a length prefix and return the body length it announces.
    fn body_length(&self, length: u32) -> Result<usize, CodecError> {
        let total = usize::try_from(length).map_err(|_| CodecError::InvalidLength { length })?;
        if total < LENGTH_HEADER_SIZE {
            return Err(CodecError::InvalidLength { length });
        }
        if total > self.max_frame_length {
            return Err(CodecError::FrameTooLarge {
                size: total,
                max: self.max_frame_length,
            });
        }
        Ok(total - LENGTH_HEADER_SIZE)
    }
}

impl Default for MessageCodec {
    fn default() -> Self { Self::new(DEFAULT_MAX_FRAME_LENGTH) }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(header) = src.get(..LENGTH_HEADER_SIZE) else {
            return Ok(None);
        };
        let mut prefix = [0_u8; LENGTH_HEADER_SIZE];
        prefix.copy_from_slice(header);
        let body_len = self.body_length(read_network_u32(prefix))?;

        let frame_len = LENGTH_HEADER_SIZE + body_len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_HEADER_SIZE);
        let body = src.split_to(body_len);
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

impl Encoder<&Message> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body = serde_json::to_vec(item)?;
        let size = body.len().saturating_add(LENGTH_HEADER_SIZE);
        if size > self.max_frame_length {
            return Err(CodecError::FrameTooLarge {
                size,
                max: self.max_frame_length,
            });
        }
        let length = u32::try_from(size).map_err(|_| CodecError::FrameTooLarge {
            size,
            max: u32::MAX as usize,
        })?;

        dst.reserve(size);
        dst.put_slice(&write_network_u32(length));
        dst.put_slice(&body);
        Ok(())
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&Message>::encode(self, &item, dst)
    }
}
