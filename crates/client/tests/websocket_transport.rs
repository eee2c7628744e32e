//! End-to-end over a local WebSocket server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use iterbene_client::realtime::{ConnectionState, RealtimeClient, RealtimeOptions};
use iterbene_shared::{Envelope, TransportKind};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::{accept_async, tungstenite::Message};

const WAIT: Duration = Duration::from_secs(5);

/// Accepts one client; answers every "ping" with a "pong" carrying the
/// same payload, and hangs up on "bye".
async fn spawn_echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();

        while let Some(Ok(msg)) = ws.next().await {
            let Message::Text(text) = msg else { continue };
            let envelope: Envelope = serde_json::from_str(text.as_str()).unwrap();
            match envelope.event.as_str() {
                "ping" => {
                    let reply = Envelope::new("pong", envelope.data);
                    let json = serde_json::to_string(&reply).unwrap();
                    ws.send(Message::text(json)).await.unwrap();
                }
                "bye" => {
                    let _ = ws.close(None).await;
                    break;
                }
                _ => {}
            }
        }
    });

    format!("ws://{}/socket", addr)
}

#[tokio::test]
async fn round_trip_over_websocket() {
    let endpoint = spawn_echo_server().await;
    let client = RealtimeClient::new();
    let options = RealtimeOptions {
        reconnection: false,
        transports: vec![TransportKind::WebSocket],
        ..Default::default()
    };

    let conn = client.initialize(&endpoint, options).unwrap();
    let mut events = conn.subscribe();
    let state = tokio::time::timeout(WAIT, conn.wait_for_state(|s| !s.is_connecting()))
        .await
        .unwrap();
    assert_eq!(state, ConnectionState::Connected);

    conn.emit("ping", json!({ "n": 1 })).unwrap();
    let reply = tokio::time::timeout(WAIT, events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.event, "pong");
    assert_eq!(reply.data, json!({ "n": 1 }));

    // Server hangs up; with reconnection off the connection stays down
    conn.emit("bye", json!(null)).unwrap();
    let state = tokio::time::timeout(
        WAIT,
        conn.wait_for_state(|s| *s == ConnectionState::Disconnected),
    )
    .await
    .unwrap();
    assert_eq!(state, ConnectionState::Disconnected);

    client.dispose();
    assert!(client.get_connection().is_none());
}

#[tokio::test]
async fn refused_port_ends_offline() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RealtimeClient::new();
    let options = RealtimeOptions {
        reconnection_attempts: 1,
        reconnection_delay: Duration::from_millis(10),
        transports: vec![TransportKind::WebSocket],
        ..Default::default()
    };
    let conn = client
        .initialize(&format!("ws://{}/socket", addr), options)
        .unwrap();

    let state = tokio::time::timeout(WAIT, conn.wait_for_state(|s| s.is_terminal()))
        .await
        .unwrap();
    assert_eq!(state, ConnectionState::ReconnectExhausted);
    assert!(conn.emit("ping", json!({})).is_err());
}
