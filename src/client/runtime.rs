//! The client facade kept by the embedding process.

use std::sync::Arc;

use tokio::sync::watch;

use super::{ClientBuilder, ClientError, Outbound};
use crate::{
    connection::ConnectionState,
    dial::Dialer,
    environment::Environment,
    message::Message,
};

/// Handle to a running client pipeline.
///
/// Dropping the `Client` does not stop the workers; they run until the
/// runtime shuts down.
#[derive(Debug)]
pub struct Client {
    host: String,
    outbound: Outbound,
    state: Arc<ConnectionState>,
    environment: Environment,
}

impl Client {
    pub(super) fn new(
        host: String,
        outbound: Outbound,
        state: Arc<ConnectionState>,
        environment: Environment,
    ) -> Self {
        Self {
            host,
            outbound,
            state,
            environment,
        }
    }

    /// Start building a client for `host` using `dialer`.
    pub fn builder(host: impl Into<String>, dialer: impl Dialer) -> ClientBuilder {
        ClientBuilder::new(host, dialer)
    }

    /// Start building a client from validated settings.
    ///
    /// # Errors
    ///
    /// See [`ClientBuilder::from_settings`].
    pub fn from_settings(settings: &crate::config::Settings) -> Result<ClientBuilder, ClientError> {
        ClientBuilder::from_settings(settings)
    }

    /// Queue `message` for sending, waiting while the queue is full.
    ///
    /// Success means the message was queued, not delivered: if the client is
    /// disconnected when the send worker reaches it, it is logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::QueueClosed`] if the send worker has stopped.
    pub async fn enqueue(&self, message: Message) -> Result<(), ClientError> {
        self.outbound.enqueue(message).await
    }

    /// A cloneable producer handle for the outbound queue.
    #[must_use]
    pub fn outbound(&self) -> Outbound { self.outbound.clone() }

    /// Identity stamped into outbound messages.
    #[must_use]
    pub fn host(&self) -> &str { &self.host }

    /// Returns `true` while a connection is established.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.state.is_connected() }

    /// Observe connectivity transitions.
    #[must_use]
    pub fn connection_events(&self) -> watch::Receiver<bool> { self.state.subscribe() }

    /// Host metadata shared with the request handler.
    #[must_use]
    pub fn environment(&self) -> &Environment { &self.environment }

    /// Wait forever.
    ///
    /// Keeps the hosting task alive once the workers are running; the future
    /// never resolves.
    pub async fn run_forever(&self) { std::future::pending::<()>().await }
}
