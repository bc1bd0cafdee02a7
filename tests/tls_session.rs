//! End-to-end tests over a real loopback mutual TLS session.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use serde_json::json;
use tempfile::TempDir;
use tokio::{net::TcpListener, time::timeout};
use warplink::{Client, ClientTlsFiles, DialError, Dialer, Message, TlsDialer};
use warplink_testing::{ForwardingHandler, TestPki, TlsTestServer, message};

const STEP: Duration = Duration::from_secs(10);

struct Material {
    pki: TestPki,
    files: ClientTlsFiles,
    _dir: TempDir,
}

#[fixture]
fn material() -> Material {
    let pki = TestPki::generate();
    let dir = TempDir::new().expect("create temp dir");
    let files = pki.write_client_files(dir.path());
    Material {
        pki,
        files,
        _dir: dir,
    }
}

#[rstest]
#[tokio::test]
async fn messages_flow_both_ways(material: Material) {
    let server = TlsTestServer::bind(&material.pki).await.expect("bind server");
    let config = material.files.load().expect("load client TLS files");
    let dialer = TlsDialer::new(server.address(), config).expect("dialer");
    let (handler, mut deliveries) = ForwardingHandler::new();

    let client = Client::builder("agent-7", dialer)
        .handler(handler)
        .start()
        .expect("start client");
    let mut session = timeout(STEP, server.accept())
        .await
        .expect("accept in time")
        .expect("handshake");

    let mut events = client.connection_events();
    timeout(STEP, events.wait_for(|connected| *connected))
        .await
        .expect("connected in time")
        .expect("state alive");

    session
        .send(message("uptime"))
        .await
        .expect("server send");
    let delivery = timeout(STEP, deliveries.recv())
        .await
        .expect("delivered in time")
        .expect("handler alive");
    assert_eq!(delivery.message, message("uptime"));
    assert!(deliveries.try_recv().is_err(), "exactly one delivery");

    client
        .enqueue(Message::new().with_field("Uptime", json!(42)))
        .await
        .expect("enqueue");
    let received = timeout(STEP, session.next())
        .await
        .expect("frame in time")
        .expect("stream open")
        .expect("decode");
    assert_eq!(received.host, "agent-7");
    assert_eq!(received.field("Uptime"), Some(&json!(42)));
}

#[rstest]
#[tokio::test]
async fn client_reconnects_after_server_hangup(material: Material) {
    let server = TlsTestServer::bind(&material.pki).await.expect("bind server");
    let config = material.files.load().expect("load client TLS files");
    let dialer = TlsDialer::new(server.address(), config).expect("dialer");
    let (handler, mut deliveries) = ForwardingHandler::new();

    let _client = Client::builder("agent-7", dialer)
        .handler(handler)
        .retry_interval(Duration::from_millis(50))
        .start()
        .expect("start client");

    let first = timeout(STEP, server.accept())
        .await
        .expect("first accept in time")
        .expect("first handshake");
    drop(first);

    let mut second = timeout(STEP, server.accept())
        .await
        .expect("second accept in time")
        .expect("second handshake");
    second.send(message("ping")).await.expect("server send");
    let delivery = timeout(STEP, deliveries.recv())
        .await
        .expect("delivered in time")
        .expect("handler alive");
    assert_eq!(delivery.message, message("ping"));
}

#[rstest]
#[tokio::test]
async fn untrusted_server_fails_handshake(material: Material) {
    let impostor = TestPki::generate();
    let server = TlsTestServer::bind(&impostor).await.expect("bind server");
    let address = server.address();
    let accept = tokio::spawn(async move { server.accept().await.is_ok() });

    let config = material.files.load().expect("load client TLS files");
    let dialer = TlsDialer::new(address, config).expect("dialer");
    match timeout(STEP, dialer.dial()).await.expect("dial finishes") {
        Err(DialError::Handshake { .. }) => {}
        Err(other) => panic!("expected handshake error, got {other}"),
        Ok(_) => panic!("handshake with untrusted server succeeded"),
    }
    let accepted = timeout(STEP, accept)
        .await
        .expect("server finishes")
        .expect("server task");
    assert!(!accepted, "server must not complete the handshake");
}

#[rstest]
#[tokio::test]
async fn refused_tcp_connect_is_reported(material: Material) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr").to_string();
    drop(listener);

    let config = material.files.load().expect("load client TLS files");
    let dialer = TlsDialer::new(address, config).expect("dialer");
    match dialer.dial().await {
        Err(DialError::Connect { .. }) => {}
        Err(other) => panic!("expected connect error, got {other}"),
        Ok(_) => panic!("dial unexpectedly succeeded"),
    }
}

#[rstest]
#[tokio::test]
async fn silent_server_hits_dial_timeout(material: Material) {
    // Accepts TCP but never answers the handshake.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr").to_string();
    let _held = tokio::spawn(async move { listener.accept().await });

    let config = material.files.load().expect("load client TLS files");
    let dialer = TlsDialer::new(address, config)
        .expect("dialer")
        .with_timeout(Duration::from_millis(200));
    match timeout(STEP, dialer.dial()).await.expect("dial gives up") {
        Err(DialError::Timeout { limit, .. }) => assert_eq!(limit, Duration::from_millis(200)),
        Err(other) => panic!("expected timeout, got {other}"),
        Ok(_) => panic!("dial unexpectedly succeeded"),
    }
}

#[rstest]
fn address_without_port_is_rejected(material: Material) {
    let config = material.files.load().expect("load client TLS files");
    assert!(matches!(
        TlsDialer::new("collector.example.net", config),
        Err(DialError::InvalidServerName { .. })
    ));
}
