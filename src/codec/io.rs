//! Async drivers for the frame codec.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use super::{CodecError, LENGTH_HEADER_SIZE, MessageCodec};
use crate::message::Message;

/// Size of the first read issued for each frame.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Reads whole [`Message`] frames from an async byte source.
///
/// Bytes received beyond the end of a frame are retained and served to the
/// next [`read_message`](Self::read_message) call. A reader that returned an
/// error has lost frame alignment and should be dropped.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buffer: BytesMut,
    codec: MessageCodec,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Wrap `inner` using the default codec limits.
    pub fn new(inner: R) -> Self { Self::with_codec(inner, MessageCodec::default()) }

    /// Wrap `inner` using `codec` for frame validation.
    pub fn with_codec(inner: R, codec: MessageCodec) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            codec,
        }
    }

    /// Number of bytes buffered but not yet consumed by a frame.
    #[must_use]
    pub fn buffered(&self) -> usize { self.buffer.len() }

    /// Consume the reader, returning the wrapped source.
    pub fn into_inner(self) -> R { self.inner }

    /// Read the next complete frame and decode its body.
    ///
    /// When no header is buffered a single read is issued; if it still leaves
    /// fewer than four bytes the frame is rejected as short. The body is then
    /// accumulated across as many reads as it takes.
    ///
    /// # Errors
    ///
    /// - [`CodecError::Disconnected`] when any read returns zero bytes.
    /// - [`CodecError::ShortFrame`] when the header is incomplete after the first read.
    /// - [`CodecError::InvalidLength`] / [`CodecError::FrameTooLarge`] for bad prefixes.
    /// - [`CodecError::Serde`] when the body is not a valid message.
    /// - [`CodecError::Io`] for transport failures.
    pub async fn read_message(&mut self) -> Result<Message, CodecError> {
        if self.buffer.len() < LENGTH_HEADER_SIZE {
            self.fill().await?;
            if self.buffer.len() < LENGTH_HEADER_SIZE {
                return Err(CodecError::ShortFrame {
                    have: self.buffer.len(),
                });
            }
        }
        loop {
            if let Some(message) = self.codec.decode(&mut self.buffer)? {
                return Ok(message);
            }
            self.fill().await?;
        }
    }

    async fn fill(&mut self) -> Result<(), CodecError> {
        self.buffer.reserve(READ_CHUNK_SIZE);
        let read = self.inner.read_buf(&mut self.buffer).await?;
        if read == 0 {
            return Err(CodecError::Disconnected);
        }
        Ok(())
    }
}

/// Encode `message` and write the whole frame to `writer`.
///
/// Partial writes advance an offset so only the unwritten remainder is
/// retried. Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`CodecError::Serde`] or [`CodecError::FrameTooLarge`] if the
/// message cannot be framed, and [`CodecError::Io`] if the transport fails or
/// stops accepting bytes.
pub async fn write_frame<W>(
    writer: &mut W,
    mut codec: MessageCodec,
    message: &Message,
) -> Result<usize, CodecError>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = BytesMut::new();
    codec.encode(message, &mut frame)?;

    let mut offset = 0;
    while offset < frame.len() {
        let written = writer.write(&frame[offset..]).await?;
        if written == 0 {
            return Err(std::io::Error::from(std::io::ErrorKind::WriteZero).into());
        }
        offset += written;
    }
    writer.flush().await?;
    Ok(offset)
}
