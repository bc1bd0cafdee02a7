//! Loopback TLS server speaking the warplink framing.

use std::{io, net::SocketAddr};

use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::{TlsAcceptor, server::TlsStream};
use tokio_util::codec::Framed;
use warplink::MessageCodec;

use crate::TestPki;

/// Accepted server-side session, framed with [`MessageCodec`].
pub type ServerConnection = Framed<TlsStream<TcpStream>, MessageCodec>;

/// Mutual TLS listener bound to an ephemeral loopback port.
pub struct TlsTestServer {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    local_addr: SocketAddr,
}

impl TlsTestServer {
    /// Bind to `127.0.0.1:0` using the server material from `pki`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while binding the listener.
    pub async fn bind(pki: &TestPki) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            acceptor: TlsAcceptor::from(pki.server_config()),
            local_addr,
        })
    }

    /// `host:port` for dialling this server.
    #[must_use]
    pub fn address(&self) -> String { self.local_addr.to_string() }

    /// Accept one TCP connection and complete the TLS handshake.
    ///
    /// # Errors
    ///
    /// Returns the accept error or the handshake failure.
    pub async fn accept(&self) -> io::Result<ServerConnection> {
        let (tcp, _) = self.listener.accept().await?;
        let tls = self.acceptor.accept(tcp).await?;
        Ok(Framed::new(tls, MessageCodec::default()))
    }
}
