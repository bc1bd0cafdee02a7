//! Tests for connection handles and the shared connection state.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::io::{DuplexStream, duplex};
use tokio_util::codec::Framed;

use super::{Connection, ConnectionState};
use crate::{codec::MessageCodec, message::Message};

fn pipe() -> (Arc<Connection>, DuplexStream) {
    let (client, server) = duplex(4096);
    let connection = Connection::new(Box::new(client), "test-peer", MessageCodec::default());
    (Arc::new(connection), server)
}

#[fixture]
fn state() -> ConnectionState { ConnectionState::new() }

#[rstest]
fn starts_disconnected(state: ConnectionState) {
    assert!(!state.is_connected());
    assert!(state.snapshot().is_none());
    assert!(!*state.subscribe().borrow());
    assert!(!state.mark_disconnected(), "nothing to disconnect");
}

#[rstest]
#[tokio::test]
async fn connected_exactly_when_handle_present(state: ConnectionState) {
    let (connection, _server) = pipe();
    let id = connection.id();

    state.mark_connected(connection);
    assert!(state.is_connected());
    assert_eq!(state.snapshot().map(|c| c.id()), Some(id));

    assert!(state.mark_disconnected());
    assert!(!state.is_connected());
    assert!(state.snapshot().is_none());
}

#[rstest]
#[tokio::test]
async fn disconnect_closes_the_handle(state: ConnectionState) {
    let (connection, _server) = pipe();
    state.mark_connected(Arc::clone(&connection));
    let snapshot = state.snapshot().expect("connected");

    assert!(state.mark_disconnected());
    assert!(connection.is_closed());
    assert!(snapshot.is_closed(), "snapshots share the closed handle");
    assert!(!state.mark_disconnected(), "second disconnect is a no-op");
}

#[rstest]
#[tokio::test]
async fn reconnect_closes_stale_handle(state: ConnectionState) {
    let (first, _first_server) = pipe();
    let (second, _second_server) = pipe();
    let second_id = second.id();

    state.mark_connected(Arc::clone(&first));
    state.mark_connected(second);

    assert!(first.is_closed());
    assert_eq!(state.snapshot().map(|c| c.id()), Some(second_id));
}

#[rstest]
#[tokio::test]
async fn transitions_are_published(state: ConnectionState) {
    let mut events = state.subscribe();
    let (connection, _server) = pipe();

    state.mark_connected(connection);
    events.changed().await.expect("state alive");
    assert!(*events.borrow_and_update());

    state.mark_disconnected();
    events.changed().await.expect("state alive");
    assert!(!*events.borrow_and_update());
}

#[tokio::test]
async fn closed_handle_rejects_io() {
    let (connection, _server) = pipe();
    assert!(connection.close());
    assert!(!connection.close(), "already closed");

    assert!(matches!(
        connection.read_message().await,
        Err(crate::codec::CodecError::Closed)
    ));
    assert!(matches!(
        connection.write_message(&Message::new()).await,
        Err(crate::codec::CodecError::Closed)
    ));
}

#[tokio::test]
async fn close_interrupts_pending_read() {
    let (connection, _server) = pipe();
    let reader = tokio::spawn({
        let connection = Arc::clone(&connection);
        async move { connection.read_message().await }
    });
    tokio::task::yield_now().await;

    connection.close();
    let result = reader.await.expect("reader task");
    assert!(matches!(result, Err(crate::codec::CodecError::Closed)));
}

#[tokio::test]
async fn reads_and_writes_proceed_concurrently() {
    let (connection, server) = pipe();
    let mut server = Framed::new(server, MessageCodec::default());

    // A read is parked on the handle while a write goes through.
    let reader = tokio::spawn({
        let connection = Arc::clone(&connection);
        async move { connection.read_message().await }
    });
    tokio::task::yield_now().await;

    let outbound = Message::new().with_field("Kind", json!("report"));
    connection
        .write_message(&outbound)
        .await
        .expect("write while read pending");
    let received = server.next().await.expect("frame").expect("decode");
    assert_eq!(received, outbound);

    let inbound = Message::new().with_field("Kind", json!("command"));
    server.send(inbound.clone()).await.expect("server send");
    let read = reader.await.expect("reader task").expect("read");
    assert_eq!(read, inbound);
}
