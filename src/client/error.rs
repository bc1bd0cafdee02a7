//! Error types for client construction and producers.

use thiserror::Error;

use crate::{dial::DialError, message::Message, tls::TlsError};

/// Errors surfaced by [`crate::Client`] and its builder.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The send worker is gone, so nothing drains the outbound queue.
    #[error("outbound queue closed")]
    QueueClosed,
    /// The outbound queue is full; the message is handed back.
    #[error("outbound queue full")]
    QueueFull(Box<Message>),
    /// Certificate material could not be loaded.
    #[error(transparent)]
    Tls(#[from] TlsError),
    /// The dialer could not be configured.
    #[error(transparent)]
    Dial(#[from] DialError),
    /// The client was started outside a tokio runtime.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
