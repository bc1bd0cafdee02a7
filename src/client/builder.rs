//! Builder wiring the client pipeline.

use std::{fmt, sync::Arc, time::Duration};

use tokio::{runtime::Handle, sync::mpsc};
use tracing::info;

use super::{
    Client,
    ClientError,
    DEFAULT_QUEUE_CAPACITY,
    DEFAULT_READ_TIMEOUT,
    DEFAULT_RETRY_INTERVAL,
    Outbound,
    dispatch::DispatchWorker,
    reader::ReadWorker,
    sender::SendWorker,
};
use crate::{
    codec::{DEFAULT_MAX_FRAME_LENGTH, MessageCodec},
    config::Settings,
    connection::ConnectionState,
    dial::{Dialer, TlsDialer},
    environment::{Environment, EnvironmentBuilder, spawn_builder},
    handler::{LoggingHandler, RequestHandler},
};

/// Collects the collaborators and limits for a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use warplink::{Client, Settings, SystemEnvironmentBuilder};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = Settings::from_file("/etc/warplink/agent.toml")?;
/// settings.validate()?;
/// let client = Client::from_settings(&settings)?
///     .environment_builder(SystemEnvironmentBuilder)
///     .start()?;
/// client.run_forever().await;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    host: String,
    dialer: Arc<dyn Dialer>,
    handler: Arc<dyn RequestHandler>,
    environment_builder: Option<Arc<dyn EnvironmentBuilder>>,
    inbound_capacity: usize,
    outbound_capacity: usize,
    retry_interval: Duration,
    read_timeout: Duration,
    max_frame_length: usize,
}

impl ClientBuilder {
    /// Start a builder for an agent identified by `host` that obtains its
    /// connections from `dialer`.
    ///
    /// Requests are logged by [`LoggingHandler`] until a handler is set.
    pub fn new(host: impl Into<String>, dialer: impl Dialer) -> Self {
        Self {
            host: host.into(),
            dialer: Arc::new(dialer),
            handler: Arc::new(LoggingHandler),
            environment_builder: None,
            inbound_capacity: DEFAULT_QUEUE_CAPACITY,
            outbound_capacity: DEFAULT_QUEUE_CAPACITY,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }

    /// Build from validated settings, loading the TLS material and creating a
    /// [`TlsDialer`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Tls`] if certificate material cannot be loaded
    /// and [`ClientError::Dial`] if the server address is unusable.
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let tls = settings.tls_files().load()?;
        let dialer = TlsDialer::new(settings.server_address.clone(), tls)?
            .with_timeout(settings.dial_timeout());
        Ok(Self::new(settings.host.clone(), dialer)
            .queue_capacity(settings.queue_capacity)
            .retry_interval(settings.retry_interval())
            .read_timeout(settings.read_timeout())
            .max_frame_length(settings.max_frame_length))
    }

    /// Set the request handler.
    #[must_use]
    pub fn handler(mut self, handler: impl RequestHandler) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Collect host metadata with `builder` once the client starts.
    #[must_use]
    pub fn environment_builder(mut self, builder: impl EnvironmentBuilder) -> Self {
        self.environment_builder = Some(Arc::new(builder));
        self
    }

    /// Set both queue capacities. Values below one are raised to one.
    #[must_use]
    pub fn queue_capacity(self, capacity: usize) -> Self {
        self.inbound_capacity(capacity).outbound_capacity(capacity)
    }

    /// Set the inbound queue capacity. Values below one are raised to one.
    #[must_use]
    pub fn inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = capacity.max(1);
        self
    }

    /// Set the outbound queue capacity. Values below one are raised to one.
    #[must_use]
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.max(1);
        self
    }

    /// Set the fixed delay between failed dial attempts.
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set the inactivity deadline applied to each read.
    #[must_use]
    pub fn read_timeout(mut self, limit: Duration) -> Self {
        self.read_timeout = limit;
        self
    }

    /// Set the largest frame accepted or sent.
    #[must_use]
    pub fn max_frame_length(mut self, length: usize) -> Self {
        self.max_frame_length = length;
        self
    }

    /// Spawn the workers on the current tokio runtime.
    ///
    /// The environment builder, if any, runs in the background; the client
    /// does not wait for it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoRuntime`] when called outside a runtime.
    pub fn start(self) -> Result<Client, ClientError> {
        let runtime = Handle::try_current()?;
        let (inbound_tx, inbound_rx) = mpsc::channel(self.inbound_capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(self.outbound_capacity);
        let state = Arc::new(ConnectionState::new());
        let environment = Environment::new();
        let outbound = Outbound::new(outbound_tx);

        if let Some(builder) = self.environment_builder {
            // Detached: nothing waits for collection to finish.
            drop(spawn_builder(builder, self.host.clone(), environment.clone()));
        }

        runtime.spawn(
            ReadWorker {
                dialer: self.dialer,
                state: Arc::clone(&state),
                inbound: inbound_tx,
                codec: MessageCodec::new(self.max_frame_length),
                retry_interval: self.retry_interval,
                read_timeout: self.read_timeout,
            }
            .run(),
        );
        runtime.spawn(
            DispatchWorker {
                inbound: inbound_rx,
                handler: self.handler,
                environment: environment.clone(),
                outbound: outbound.clone(),
            }
            .run(),
        );
        runtime.spawn(
            SendWorker {
                outbound: outbound_rx,
                state: Arc::clone(&state),
                host: self.host.clone(),
            }
            .run(),
        );
        info!(host = %self.host, "client workers started");

        Ok(Client::new(self.host, outbound, state, environment))
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("host", &self.host)
            .field("peer", &self.dialer.peer())
            .field("inbound_capacity", &self.inbound_capacity)
            .field("outbound_capacity", &self.outbound_capacity)
            .field("retry_interval", &self.retry_interval)
            .field("read_timeout", &self.read_timeout)
            .field("max_frame_length", &self.max_frame_length)
            .finish_non_exhaustive()
    }
}
