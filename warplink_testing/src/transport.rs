//! In-memory transports for exercising partial reads and writes.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Serves a fixed byte sequence at most `chunk` bytes per read, then EOF.
///
/// The first read may be given a different size with
/// [`with_first_read`](Self::with_first_read).
#[derive(Debug)]
pub struct TrickleReader {
    data: Vec<u8>,
    position: usize,
    first: Option<usize>,
    chunk: usize,
    reads: usize,
}

impl TrickleReader {
    /// Serve `data` in pieces no larger than `chunk` (minimum one byte).
    pub fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        Self {
            data: data.into(),
            position: 0,
            first: None,
            chunk: chunk.max(1),
            reads: 0,
        }
    }

    /// Serve `len` bytes on the first read, then fall back to `chunk`.
    #[must_use]
    pub fn with_first_read(mut self, len: usize) -> Self {
        self.first = Some(len.max(1));
        self
    }

    /// Number of reads that returned data.
    #[must_use]
    pub fn reads(&self) -> usize { self.reads }
}

impl AsyncRead for TrickleReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let remaining = &this.data[this.position..];
        let limit = this.first.take().unwrap_or(this.chunk);
        let take = remaining.len().min(limit).min(buf.remaining());
        if take > 0 {
            buf.put_slice(&remaining[..take]);
            this.position += take;
            this.reads += 1;
        }
        Poll::Ready(Ok(()))
    }
}

/// Accepts at most `limit` bytes per write call and records everything.
#[derive(Debug)]
pub struct PartialWriter {
    written: Vec<u8>,
    limit: usize,
    calls: usize,
}

impl PartialWriter {
    /// Accept no more than `limit` bytes (minimum one) per call.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            written: Vec::new(),
            limit: limit.max(1),
            calls: 0,
        }
    }

    /// Every byte accepted so far, in order.
    #[must_use]
    pub fn written(&self) -> &[u8] { &self.written }

    /// Number of write calls that accepted bytes.
    #[must_use]
    pub fn calls(&self) -> usize { self.calls }
}

impl AsyncWrite for PartialWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let take = buf.len().min(this.limit);
        this.written.extend_from_slice(&buf[..take]);
        if take > 0 {
            this.calls += 1;
        }
        Poll::Ready(Ok(take))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
