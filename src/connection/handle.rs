//! A single established transport session.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::{
    io::{ReadHalf, WriteHalf, split},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;

use crate::{
    codec::{CodecError, FrameReader, MessageCodec, write_frame},
    dial::BoxedStream,
    message::Message,
};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// One live encrypted stream, split into independently locked halves.
///
/// Reads and writes may proceed concurrently; each direction is serialised by
/// its own async mutex. [`close`](Self::close) is synchronous: it fires the
/// close signal so every pending and future operation on this handle fails
/// with [`CodecError::Closed`]. The socket itself is released when the last
/// reference is dropped.
pub struct Connection {
    id: u64,
    peer: String,
    codec: MessageCodec,
    reader: Mutex<FrameReader<ReadHalf<BoxedStream>>>,
    writer: Mutex<WriteHalf<BoxedStream>>,
    closed: CancellationToken,
}

impl Connection {
    /// Wrap a freshly dialled stream.
    pub fn new(stream: BoxedStream, peer: impl Into<String>, codec: MessageCodec) -> Self {
        let (read_half, write_half) = split(stream);
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            peer: peer.into(),
            codec,
            reader: Mutex::new(FrameReader::with_codec(read_half, codec)),
            writer: Mutex::new(write_half),
            closed: CancellationToken::new(),
        }
    }

    /// Process-unique identifier used in logs.
    #[must_use]
    pub fn id(&self) -> u64 { self.id }

    /// Description of the remote end.
    #[must_use]
    pub fn peer(&self) -> &str { &self.peer }

    /// Read and decode the next inbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Closed`] once the handle is closed, otherwise any
    /// error reported by [`FrameReader::read_message`].
    pub async fn read_message(&self) -> Result<Message, CodecError> {
        tokio::select! {
            biased;
            () = self.closed.cancelled() => Err(CodecError::Closed),
            result = async { self.reader.lock().await.read_message().await } => result,
        }
    }

    /// Encode and write one frame.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Closed`] once the handle is closed, otherwise any
    /// error reported by [`write_frame`].
    pub async fn write_message(&self, message: &Message) -> Result<usize, CodecError> {
        tokio::select! {
            biased;
            () = self.closed.cancelled() => Err(CodecError::Closed),
            result = async {
                let mut writer = self.writer.lock().await;
                write_frame(&mut *writer, self.codec, message).await
            } => result,
        }
    }

    /// Close the handle. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let first = !self.closed.is_cancelled();
        self.closed.cancel();
        first
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed.is_cancelled() }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
