//! Dispatch worker: hands inbound messages to the request handler.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error};

use super::Outbound;
use crate::{
    environment::Environment,
    handler::RequestHandler,
    message::Message,
    panic::PanicMessage,
};

pub(super) struct DispatchWorker {
    pub(super) inbound: mpsc::Receiver<Message>,
    pub(super) handler: Arc<dyn RequestHandler>,
    pub(super) environment: Environment,
    pub(super) outbound: Outbound,
}

impl DispatchWorker {
    /// Invoke the handler once per message, strictly in arrival order.
    pub(super) async fn run(mut self) {
        while let Some(message) = self.inbound.recv().await {
            let outcome = AssertUnwindSafe(self.handler.handle(
                message,
                &self.environment,
                &self.outbound,
            ))
            .catch_unwind()
            .await;
            if let Err(panic) = outcome {
                error!(panic = %PanicMessage::new(&panic), "request handler panicked");
            }
        }
        debug!("inbound queue closed, dispatch worker stopping");
    }
}
