//! Test support for `warplink`.
//!
//! - [`transport`]: in-memory byte streams that misbehave on purpose
//!   (one-byte reads, short writes).
//! - [`dialer`]: dialers driven by a script instead of the network.
//! - [`handler`]: a request handler that forwards deliveries to a channel.
//! - [`pki`]: a throwaway CA with server and client certificates.
//! - [`server`]: a mutual TLS server speaking the warplink framing.

pub mod dialer;
pub mod handler;
pub mod pki;
pub mod server;
pub mod transport;

pub use dialer::{FailingDialer, ScriptedDialer};
pub use handler::{Delivery, ForwardingHandler};
pub use pki::TestPki;
pub use server::{ServerConnection, TlsTestServer};
pub use transport::{PartialWriter, TrickleReader};

/// Build a message carrying a single `Kind` payload member.
#[must_use]
pub fn message(kind: &str) -> warplink::Message {
    warplink::Message::new().with_field("Kind", kind.into())
}
