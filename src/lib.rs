//! Public API for the `warplink` library.
//!
//! `warplink` is the transport layer of an always-on remote agent. It keeps a
//! mutually authenticated TLS session to a fixed server, exchanges
//! length-prefixed JSON messages over a concurrent read/dispatch/write
//! pipeline, and reconnects forever when the session drops.

pub mod byte_order;
pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod dial;
pub mod environment;
pub mod handler;
pub mod logging;
pub mod message;
pub mod panic;
pub mod tls;

pub use client::{Client, ClientBuilder, ClientError, Outbound};
pub use codec::{CodecError, FrameReader, MessageCodec};
pub use config::{ConfigError, LogDestination, Settings};
pub use dial::{BoxedStream, DialError, Dialer, TlsDialer};
pub use environment::{Environment, EnvironmentBuilder, HostMetadata, SystemEnvironmentBuilder};
pub use handler::{LoggingHandler, RequestHandler};
pub use message::Message;
pub use tls::{ClientTlsFiles, TlsError};
