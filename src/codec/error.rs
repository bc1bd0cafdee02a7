//! Error types for the frame codec.
//!
//! Every variant is recoverable from the pipeline's point of view: read-side
//! errors tear the connection down and send the reader back to dialing, while
//! write-side errors cost only the message being written.

use std::io;

use thiserror::Error;

/// Errors produced while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Fewer than four header bytes were available after a read.
    #[error("short frame: {have} of 4 header bytes available")]
    ShortFrame {
        /// Bytes buffered when the header was inspected.
        have: usize,
    },
    /// The length prefix cannot describe a frame (it is below the header size).
    #[error("invalid frame length {length}")]
    InvalidLength {
        /// Length announced by the prefix.
        length: u32,
    },
    /// The frame exceeds the configured maximum.
    #[error("frame of {size} bytes exceeds maximum of {max}")]
    FrameTooLarge {
        /// Total frame size including the header.
        size: usize,
        /// Maximum accepted frame size.
        max: usize,
    },
    /// The peer closed the connection (a read returned zero bytes).
    #[error("connection closed by peer")]
    Disconnected,
    /// The connection handle was closed locally.
    #[error("connection handle closed")]
    Closed,
    /// The body could not be serialized or deserialized.
    #[error("malformed message body: {0}")]
    Serde(#[from] serde_json::Error),
    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Returns `true` when the error means the peer hung up.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Disconnected => true,
            Self::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
