//! Send worker: drains the outbound queue onto the live connection.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::{connection::ConnectionState, message::Message};

pub(super) struct SendWorker {
    pub(super) outbound: mpsc::Receiver<Message>,
    pub(super) state: Arc<ConnectionState>,
    pub(super) host: String,
}

impl SendWorker {
    /// Send each queued message once; drop it if that is not possible.
    ///
    /// A failed write leaves the connection state alone. The reader notices
    /// a broken connection on its next read and reconnects.
    pub(super) async fn run(mut self) {
        while let Some(mut message) = self.outbound.recv().await {
            message.stamp_host(&self.host);
            let Some(connection) = self.state.snapshot() else {
                warn!("not connected, dropping outbound message");
                continue;
            };
            match connection.write_message(&message).await {
                Ok(bytes) => trace!(connection_id = connection.id(), bytes, "message sent"),
                Err(error) => warn!(
                    %error,
                    connection_id = connection.id(),
                    "failed to send message, dropping it"
                ),
            }
        }
        debug!("outbound queue closed, send worker stopping");
    }
}
