//! End-to-end tests: a real server on a loopback port driven by real WebSocket clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lib_core::Config;
use lib_web::chat::ChatAppState;
use lib_web::create_router;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const FRAME_WAIT: Duration = Duration::from_secs(2);
const SILENCE_WAIT: Duration = Duration::from_millis(200);

// region: --- Helpers

async fn spawn_relay(config: Config) -> (SocketAddr, Arc<ChatAppState>) {
    let state = Arc::new(ChatAppState::new(config));
    let app = create_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

/// Connect and consume the `connected` greeting.
async fn connect(addr: SocketAddr) -> (Client, Value) {
    let (mut client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let hello = next_json(&mut client).await;
    (client, hello)
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(FRAME_WAIT, client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("transport error");
        if let Message::Text(_) = frame {
            return serde_json::from_str(frame.to_text().unwrap()).unwrap();
        }
    }
}

async fn assert_silent(client: &mut Client) {
    let waited = tokio::time::timeout(SILENCE_WAIT, client.next()).await;
    assert!(waited.is_err(), "unexpected frame: {:?}", waited);
}

async fn send_json(client: &mut Client, value: Value) {
    client.send(Message::text(value.to_string())).await.unwrap();
}

async fn join(client: &mut Client, username: &str, room: &str) {
    send_json(
        client,
        json!({"type": "join", "user": {"username": username}, "room": room}),
    )
    .await;
}

async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached");
}

// endregion: --- Helpers

#[tokio::test]
async fn test_connect_sends_client_id() {
    let (addr, state) = spawn_relay(Config::default()).await;

    let (_client, hello) = connect(addr).await;

    assert_eq!(hello["type"], "connected");
    assert!(uuid::Uuid::parse_str(hello["clientId"].as_str().unwrap()).is_ok());
    assert!(hello["timestamp"].as_str().unwrap().ends_with('Z'));
    assert_eq!(state.directory.connected_sessions().await, 1);
}

#[tokio::test]
async fn test_join_notice_reaches_every_member() {
    // Arrange
    let (addr, _state) = spawn_relay(Config::default()).await;
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    // Act
    join(&mut alice, "alice", "general").await;
    let alice_notice = next_json(&mut alice).await;
    join(&mut bob, "bob", "general").await;

    // Assert
    assert_eq!(alice_notice["type"], "system");
    assert_eq!(alice_notice["message"], "alice joined the room");
    assert_eq!(alice_notice["room"], "general");

    for client in [&mut alice, &mut bob] {
        let notice = next_json(client).await;
        assert_eq!(notice["message"], "bob joined the room");
    }
}

#[tokio::test]
async fn test_message_is_relayed_with_server_timestamp() {
    // Arrange
    let (addr, state) = spawn_relay(Config::default()).await;
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;
    join(&mut alice, "alice", "general").await;
    next_json(&mut alice).await;
    join(&mut bob, "bob", "general").await;
    next_json(&mut alice).await;
    next_json(&mut bob).await;

    // Act
    send_json(
        &mut alice,
        json!({
            "type": "message",
            "id": "m-1",
            "user": {"username": "alice", "avatar": "a.png"},
            "text": "hello",
            "room": "general",
            "timestamp": "1999-01-01T00:00:00.000Z"
        }),
    )
    .await;

    // Assert
    for client in [&mut alice, &mut bob] {
        let relayed = next_json(client).await;
        assert_eq!(relayed["type"], "message");
        assert_eq!(relayed["id"], "m-1");
        assert_eq!(relayed["text"], "hello");
        assert_eq!(relayed["user"]["avatar"], "a.png");
        assert_ne!(relayed["timestamp"], "1999-01-01T00:00:00.000Z");
    }
    assert_eq!(state.total_messages(), 1);
    assert_eq!(state.directory.history("general").await.len(), 1);
}

#[tokio::test]
async fn test_message_stays_in_its_room() {
    let (addr, _state) = spawn_relay(Config::default()).await;
    let (mut alice, _) = connect(addr).await;
    let (mut carol, _) = connect(addr).await;
    join(&mut alice, "alice", "general").await;
    next_json(&mut alice).await;
    join(&mut carol, "carol", "tech").await;
    next_json(&mut carol).await;

    send_json(
        &mut alice,
        json!({"type": "message", "id": 7, "user": {"username": "alice"}, "text": "hi", "room": "general"}),
    )
    .await;

    assert_eq!(next_json(&mut alice).await["id"], 7);
    assert_silent(&mut carol).await;
}

#[tokio::test]
async fn test_typing_is_not_echoed_to_sender() {
    // Arrange
    let (addr, _state) = spawn_relay(Config::default()).await;
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;
    join(&mut alice, "alice", "general").await;
    next_json(&mut alice).await;
    join(&mut bob, "bob", "general").await;
    next_json(&mut alice).await;
    next_json(&mut bob).await;

    // Act
    send_json(
        &mut alice,
        json!({"type": "typing", "user": {"username": "alice"}, "room": "general"}),
    )
    .await;

    // Assert
    let typing = next_json(&mut bob).await;
    assert_eq!(typing, json!({"type": "typing", "username": "alice", "room": "general"}));
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_malformed_frames_keep_the_session_open() {
    let (addr, state) = spawn_relay(Config::default()).await;
    let (mut alice, _) = connect(addr).await;

    alice.send(Message::text("not json")).await.unwrap();
    send_json(&mut alice, json!({"type": "join", "room": "general"})).await;
    send_json(&mut alice, json!({"type": "dance", "room": "general"})).await;
    join(&mut alice, "alice", "general").await;

    let notice = next_json(&mut alice).await;
    assert_eq!(notice["message"], "alice joined the room");
    assert_eq!(state.directory.member_count("general").await, 1);
}

#[tokio::test]
async fn test_disconnect_removes_empty_room_from_stats() {
    // Arrange
    let (addr, state) = spawn_relay(Config::default()).await;
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;
    join(&mut alice, "alice", "general").await;
    next_json(&mut alice).await;
    join(&mut bob, "bob", "tech").await;
    next_json(&mut bob).await;

    // Act
    bob.close(None).await.unwrap();

    // Assert
    eventually(|| {
        let state = state.clone();
        async move { state.directory.connected_sessions().await == 1 }
    })
    .await;
    assert_eq!(state.directory.room_names().await, vec!["general".to_string()]);
    let snapshot = state.directory.snapshot().await;
    assert_eq!(snapshot.online_users, 1);
}

#[tokio::test]
async fn test_idle_session_is_closed() {
    let config = Config {
        idle_timeout: Some(Duration::from_millis(300)),
        ..Config::default()
    };
    let (addr, state) = spawn_relay(config).await;
    let (mut alice, _) = connect(addr).await;
    join(&mut alice, "alice", "general").await;
    next_json(&mut alice).await;

    let ended = tokio::time::timeout(FRAME_WAIT, async {
        while let Some(frame) = alice.next().await {
            match frame {
                Ok(Message::Text(_)) => panic!("unexpected text frame"),
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    })
    .await;

    assert!(ended.is_ok(), "idle session was not closed");
    eventually(|| {
        let state = state.clone();
        async move { state.directory.connected_sessions().await == 0 }
    })
    .await;
    assert!(state.directory.room_names().await.is_empty());
}
