//! Request handlers that report what they receive.

use async_trait::async_trait;
use tokio::sync::mpsc;
use warplink::{Environment, Message, Outbound, RequestHandler};

/// A message observed by [`ForwardingHandler`].
#[derive(Debug)]
pub struct Delivery {
    /// The message as received.
    pub message: Message,
    /// Whether host metadata had been published at the time.
    pub environment_ready: bool,
}

/// Forwards every inbound message to a channel.
#[derive(Clone, Debug)]
pub struct ForwardingHandler {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl ForwardingHandler {
    /// Create a handler and the receiver its deliveries go to.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl RequestHandler for ForwardingHandler {
    async fn handle(&self, message: Message, environment: &Environment, _outbound: &Outbound) {
        // The receiver may be gone once a test has seen what it needs.
        let _ = self.tx.send(Delivery {
            message,
            environment_ready: environment.is_ready(),
        });
    }
}
