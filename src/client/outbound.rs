//! Producer handle for the outbound queue.

use tokio::sync::mpsc::{self, error::TrySendError};

use super::ClientError;
use crate::message::Message;

/// Cloneable handle used by producers to queue messages for sending.
///
/// Messages are sent in enqueue order. Whether a message reaches the server
/// depends on connectivity when the send worker picks it up; drops are
/// logged, never reported back here.
#[derive(Clone, Debug)]
pub struct Outbound {
    tx: mpsc::Sender<Message>,
}

impl Outbound {
    pub(crate) fn new(tx: mpsc::Sender<Message>) -> Self { Self { tx } }

    /// Queue `message`, waiting for space if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::QueueClosed`] if the send worker has stopped.
    pub async fn enqueue(&self, message: Message) -> Result<(), ClientError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| ClientError::QueueClosed)
    }

    /// Queue `message` only if space is available right now.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::QueueFull`] carrying the message back, or
    /// [`ClientError::QueueClosed`] if the send worker has stopped.
    pub fn try_enqueue(&self, message: Message) -> Result<(), ClientError> {
        self.tx.try_send(message).map_err(|err| match err {
            TrySendError::Full(message) => ClientError::QueueFull(Box::new(message)),
            TrySendError::Closed(_) => ClientError::QueueClosed,
        })
    }

    /// Free slots in the queue.
    #[must_use]
    pub fn available(&self) -> usize { self.tx.capacity() }

    /// Total queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize { self.tx.max_capacity() }
}
