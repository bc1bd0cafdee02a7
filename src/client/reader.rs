//! Connect-and-read worker.
//!
//! Cycles `Disconnected → Connecting → Connected → Disconnected` for as long
//! as the inbound queue has a consumer. This is the only code that dials or
//! mutates the connection state.

use std::{io, ops::ControlFlow, sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    time::{sleep, timeout},
};
use tracing::{debug, info, warn};

use crate::{
    codec::{CodecError, MessageCodec},
    connection::{Connection, ConnectionState},
    dial::Dialer,
    message::Message,
};

pub(super) struct ReadWorker {
    pub(super) dialer: Arc<dyn Dialer>,
    pub(super) state: Arc<ConnectionState>,
    pub(super) inbound: mpsc::Sender<Message>,
    pub(super) codec: MessageCodec,
    pub(super) retry_interval: Duration,
    pub(super) read_timeout: Duration,
}

impl ReadWorker {
    pub(super) async fn run(self) {
        loop {
            self.connect().await;
            if self.read_until_failure().await.is_break() {
                break;
            }
        }
        self.state.mark_disconnected();
        debug!("inbound queue closed, connect-and-read worker stopping");
    }

    /// Dial until an attempt succeeds, then publish the connection.
    async fn connect(&self) {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.dialer.dial().await {
                Ok(stream) => {
                    let connection = Arc::new(Connection::new(stream, self.dialer.peer(), self.codec));
                    info!(
                        peer = connection.peer(),
                        connection_id = connection.id(),
                        attempt,
                        "connected"
                    );
                    self.state.mark_connected(connection);
                    return;
                }
                Err(error) => {
                    warn!(
                        %error,
                        attempt,
                        retry_in = ?self.retry_interval,
                        "unable to connect, will retry"
                    );
                    sleep(self.retry_interval).await;
                }
            }
        }
    }

    /// Read frames from the live connection until one fails.
    ///
    /// Breaks when the inbound queue has no consumer left.
    async fn read_until_failure(&self) -> ControlFlow<()> {
        loop {
            let Some(connection) = self.state.snapshot() else {
                return ControlFlow::Continue(());
            };
            let result = timeout(self.read_timeout, connection.read_message())
                .await
                .unwrap_or_else(|_| Err(deadline_expired(self.read_timeout)));

            match result {
                Ok(message) => {
                    drop(connection);
                    if self.inbound.send(message).await.is_err() {
                        return ControlFlow::Break(());
                    }
                }
                Err(error) => {
                    if error.is_disconnect() {
                        info!(%error, connection_id = connection.id(), "read error, closing connection");
                    } else {
                        warn!(%error, connection_id = connection.id(), "read error, closing connection");
                    }
                    drop(connection);
                    self.state.mark_disconnected();
                    return ControlFlow::Continue(());
                }
            }
        }
    }
}

fn deadline_expired(limit: Duration) -> CodecError {
    CodecError::Io(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("no data received within {limit:?}"),
    ))
}
