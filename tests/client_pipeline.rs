//! Pipeline tests over in-memory transports.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::{sync::Notify, time::timeout};
use tokio_util::codec::Framed;
use warplink::{
    Client,
    EnvironmentBuilder,
    HostMetadata,
    MessageCodec,
    SystemEnvironmentBuilder,
};
use warplink_testing::{FailingDialer, ForwardingHandler, ScriptedDialer, message};

const STEP: Duration = Duration::from_secs(10);

#[tokio::test]
async fn reconnects_after_failed_dials_and_hangups() {
    let dialer = Arc::new(ScriptedDialer::new());
    dialer.push_failure();
    let first = dialer.push_connection();
    let second = dialer.push_connection();
    let (handler, mut deliveries) = ForwardingHandler::new();

    let client = Client::builder("agent-3", Arc::clone(&dialer))
        .handler(handler)
        .retry_interval(Duration::from_millis(10))
        .start()
        .expect("start client");

    let mut first = Framed::new(first, MessageCodec::default());
    first.send(message("one")).await.expect("first send");
    let delivery = timeout(STEP, deliveries.recv()).await.expect("in time").expect("open");
    assert_eq!(delivery.message, message("one"));
    drop(first);

    let mut second = Framed::new(second, MessageCodec::default());
    second.send(message("two")).await.expect("second send");
    let delivery = timeout(STEP, deliveries.recv()).await.expect("in time").expect("open");
    assert_eq!(delivery.message, message("two"));

    assert_eq!(dialer.attempts(), 3);
    assert!(client.is_connected());

    client.enqueue(message("report")).await.expect("enqueue");
    let report = timeout(STEP, second.next())
        .await
        .expect("in time")
        .expect("open")
        .expect("decode");
    assert_eq!(report.host, "agent-3");
}

#[tokio::test(start_paused = true)]
async fn enqueue_succeeds_while_server_is_unreachable() {
    let dialer = Arc::new(FailingDialer::default());
    let client = Client::builder("agent-3", Arc::clone(&dialer))
        .queue_capacity(4)
        .start()
        .expect("start client");

    for n in 0..16 {
        client
            .enqueue(message(&format!("report-{n}")))
            .await
            .expect("queued messages are dropped, not rejected");
    }
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(!client.is_connected());
    assert!(dialer.attempts() >= 3);
}

/// Publishes only after being released.
struct GatedEnvironment {
    gate: Arc<Notify>,
}

#[async_trait]
impl EnvironmentBuilder for GatedEnvironment {
    async fn build(&self, host: &str) -> HostMetadata {
        self.gate.notified().await;
        SystemEnvironmentBuilder.build(host).await
    }
}

#[tokio::test]
async fn handler_runs_before_environment_is_ready() {
    let dialer = Arc::new(ScriptedDialer::new());
    let server = dialer.push_connection();
    let gate = Arc::new(Notify::new());
    let (handler, mut deliveries) = ForwardingHandler::new();

    let client = Client::builder("agent-3", Arc::clone(&dialer))
        .handler(handler)
        .environment_builder(GatedEnvironment {
            gate: Arc::clone(&gate),
        })
        .start()
        .expect("start client");
    assert!(client.environment().get().is_none());

    let mut server = Framed::new(server, MessageCodec::default());
    server.send(message("early")).await.expect("send");
    let delivery = timeout(STEP, deliveries.recv()).await.expect("in time").expect("open");
    assert!(!delivery.environment_ready);

    gate.notify_one();
    let metadata = timeout(STEP, client.environment().ready())
        .await
        .expect("environment published");
    assert_eq!(metadata.host, "agent-3");

    server.send(message("late")).await.expect("send");
    let delivery = timeout(STEP, deliveries.recv()).await.expect("in time").expect("open");
    assert!(delivery.environment_ready);
}
