//! Request handling capability invoked by the dispatch worker.

use async_trait::async_trait;
use tracing::info;

use crate::{client::Outbound, environment::Environment, message::Message};

/// Business logic for inbound messages.
///
/// The dispatch worker awaits `handle` for one message at a time, in arrival
/// order. A slow handler therefore throttles the whole inbound path.
/// `outbound` enqueues replies through the client's send worker.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    /// Process one inbound message.
    async fn handle(&self, message: Message, environment: &Environment, outbound: &Outbound);
}

/// Handler that logs each request and does nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingHandler;

#[async_trait]
impl RequestHandler for LoggingHandler {
    async fn handle(&self, message: Message, environment: &Environment, _outbound: &Outbound) {
        let members: Vec<&str> = message.body.keys().map(String::as_str).collect();
        info!(
            from = %message.host,
            ?members,
            environment_ready = environment.is_ready(),
            "received request"
        );
    }
}
