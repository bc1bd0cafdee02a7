//! Establishing transport sessions.
//!
//! The connect-and-read worker obtains every connection through a [`Dialer`].
//! [`TlsDialer`] performs the TCP connect and the mutual TLS handshake used in
//! production; tests substitute in-memory dialers.

use std::{fmt, io, sync::Arc, time::Duration};

use async_trait::async_trait;
use rustls::{ClientConfig, pki_types::ServerName};
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    time::timeout,
};
use tokio_rustls::TlsConnector;

/// Byte streams a connection can run over.
pub trait ClientStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}
impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Type-erased stream returned by a [`Dialer`].
pub type BoxedStream = Box<dyn ClientStream>;

/// Default bound on TCP connect plus TLS handshake.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while establishing a connection.
#[derive(Debug, Error)]
pub enum DialError {
    /// The server address has no usable host part for TLS verification.
    #[error("invalid server name in address {address:?}")]
    InvalidServerName {
        /// Configured server address.
        address: String,
    },
    /// The TCP connection could not be established.
    #[error("tcp connect to {address} failed: {source}")]
    Connect {
        /// Configured server address.
        address: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The TLS handshake failed.
    #[error("tls handshake with {address} failed: {source}")]
    Handshake {
        /// Configured server address.
        address: String,
        /// Error reported by rustls.
        #[source]
        source: io::Error,
    },
    /// Connect and handshake did not finish in time.
    #[error("dial to {address} timed out after {limit:?}")]
    Timeout {
        /// Configured server address.
        address: String,
        /// Time allowed for the attempt.
        limit: Duration,
    },
    /// Any other failure reported by a custom dialer.
    #[error(transparent)]
    Other(#[from] io::Error),
}

/// Source of new connections.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    /// Attempt to establish one connection.
    async fn dial(&self) -> Result<BoxedStream, DialError>;

    /// Human readable description of the remote end, used in logs.
    fn peer(&self) -> String;
}

#[async_trait]
impl<D> Dialer for Arc<D>
where
    D: Dialer + ?Sized,
{
    async fn dial(&self) -> Result<BoxedStream, DialError> { (**self).dial().await }

    fn peer(&self) -> String { (**self).peer() }
}

/// Dials the server over TCP and performs a mutually authenticated TLS
/// handshake.
#[derive(Clone)]
pub struct TlsDialer {
    address: String,
    server_name: ServerName<'static>,
    connector: TlsConnector,
    timeout: Duration,
}

impl TlsDialer {
    /// Create a dialer for `address` (`host:port`).
    ///
    /// The host part is used as the TLS server name.
    ///
    /// # Errors
    ///
    /// Returns [`DialError::InvalidServerName`] if the host part is missing or
    /// is neither a DNS name nor an IP address.
    pub fn new(address: impl Into<String>, config: Arc<ClientConfig>) -> Result<Self, DialError> {
        let address = address.into();
        let server_name = server_name_for(&address).ok_or_else(|| DialError::InvalidServerName {
            address: address.clone(),
        })?;
        Ok(Self {
            address,
            server_name,
            connector: TlsConnector::from(config),
            timeout: DEFAULT_DIAL_TIMEOUT,
        })
    }

    /// Bound each dial attempt by `limit`.
    #[must_use]
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = limit;
        self
    }

    async fn connect(&self) -> Result<BoxedStream, DialError> {
        let tcp = TcpStream::connect(&self.address)
            .await
            .map_err(|source| DialError::Connect {
                address: self.address.clone(),
                source,
            })?;
        tcp.set_nodelay(true)?;
        let tls = self
            .connector
            .connect(self.server_name.clone(), tcp)
            .await
            .map_err(|source| DialError::Handshake {
                address: self.address.clone(),
                source,
            })?;
        Ok(Box::new(tls))
    }
}

#[async_trait]
impl Dialer for TlsDialer {
    async fn dial(&self) -> Result<BoxedStream, DialError> {
        timeout(self.timeout, self.connect())
            .await
            .map_err(|_| DialError::Timeout {
                address: self.address.clone(),
                limit: self.timeout,
            })?
    }

    fn peer(&self) -> String { self.address.clone() }
}

impl fmt::Debug for TlsDialer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsDialer")
            .field("address", &self.address)
            .field("server_name", &self.server_name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Derive the TLS server name from a `host:port` address.
fn server_name_for(address: &str) -> Option<ServerName<'static>> {
    let (host, port) = address.rsplit_once(':')?;
    port.parse::<u16>().ok()?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return None;
    }
    ServerName::try_from(host.to_owned()).ok()
}
