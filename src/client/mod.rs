//! The always-on client pipeline.
//!
//! Three workers cooperate around one [`ConnectionState`](crate::connection::ConnectionState):
//!
//! - the connect-and-read worker dials, reads frames and feeds the inbound queue;
//! - the dispatch worker hands inbound messages to the [`RequestHandler`](crate::RequestHandler);
//! - the send worker drains the outbound queue onto the live connection.
//!
//! [`Client`] wires them together and is the handle the embedding process
//! keeps.

use std::time::Duration;

mod builder;
mod dispatch;
mod error;
mod outbound;
mod reader;
mod runtime;
mod sender;

pub use builder::ClientBuilder;
pub use error::ClientError;
pub use outbound::Outbound;
pub use runtime::Client;

/// Default capacity of the inbound and outbound queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default delay between failed dial attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Default inactivity deadline for a single read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);
