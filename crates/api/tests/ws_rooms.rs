//! Tests for WebSocket room membership and event fan-out.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::ws::Message;
use tokio::sync::mpsc::UnboundedReceiver;

use pulsefit_api::ws::{start_heartbeat, WsManager, WsRoomSender};
use pulsefit_events::RoomSender;

/// Drain one pending message, panicking if none is queued.
fn expect_message(rx: &mut UnboundedReceiver<Message>) -> Message {
    rx.try_recv().expect("expected a queued message")
}

fn text_json(message: Message) -> serde_json::Value {
    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Room membership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_joins_user_room() {
    let manager = WsManager::new();
    manager.add("conn-1".to_string()).await;

    let rooms = manager.register("conn-1", "user-9", false).await.unwrap();
    assert_eq!(rooms, vec!["user:user-9".to_string()]);
}

#[tokio::test]
async fn register_admin_joins_admin_room_too() {
    let manager = WsManager::new();
    manager.add("conn-1".to_string()).await;

    let rooms = manager.register("conn-1", "coach", true).await.unwrap();
    assert_eq!(rooms, vec!["admin".to_string(), "user:coach".to_string()]);
}

#[tokio::test]
async fn register_unknown_connection_returns_none() {
    let manager = WsManager::new();
    assert!(manager.register("ghost", "user-9", false).await.is_none());
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_room_reaches_only_members() {
    let manager = WsManager::new();
    let mut rx_a = manager.add("conn-a".to_string()).await;
    let mut rx_b = manager.add("conn-b".to_string()).await;

    manager.register("conn-a", "alpha", false).await;
    manager.register("conn-b", "beta", false).await;

    let delivered = manager
        .send_to_room("user:alpha", Message::Text("hello".into()))
        .await;
    assert_eq!(delivered, 1);

    assert_matches!(expect_message(&mut rx_a), Message::Text(t) if t.as_str() == "hello");
    assert!(rx_b.try_recv().is_err(), "non-member must not receive");
}

#[tokio::test]
async fn broadcast_reaches_every_connection() {
    let manager = WsManager::new();
    let mut rx_a = manager.add("conn-a".to_string()).await;
    let mut rx_b = manager.add("conn-b".to_string()).await;

    // conn-b never registered; broadcast still reaches it.
    manager.register("conn-a", "alpha", false).await;
    manager.broadcast(Message::Text("all".into())).await;

    assert_matches!(expect_message(&mut rx_a), Message::Text(_));
    assert_matches!(expect_message(&mut rx_b), Message::Text(_));
}

#[tokio::test]
async fn removed_connection_receives_nothing() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-a".to_string()).await;
    manager.register("conn-a", "alpha", false).await;
    manager.remove("conn-a").await;

    let delivered = manager
        .send_to_room("user:alpha", Message::Text("late".into()))
        .await;
    assert_eq!(delivered, 0);
    assert!(rx.try_recv().is_err());
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn heartbeat_pings_at_configured_interval() {
    let manager = Arc::new(WsManager::new());
    let mut rx = manager.add("conn-a".to_string()).await;

    let handle = start_heartbeat(Arc::clone(&manager), Duration::from_millis(10));

    let frame = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no ping within a second")
        .expect("channel closed");
    assert_matches!(frame, Message::Ping(_));
    handle.abort();
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-a".to_string()).await;

    manager.shutdown_all().await;

    assert_matches!(expect_message(&mut rx), Message::Close(_));
    assert_eq!(manager.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// RoomSender adapter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn room_sender_wraps_payload_in_event_envelope() {
    let manager = Arc::new(WsManager::new());
    let mut rx = manager.add("conn-a".to_string()).await;
    manager.register("conn-a", "alpha", false).await;

    let sender = WsRoomSender::new(Arc::clone(&manager));
    sender
        .send_to_room(
            "user:alpha",
            "workout-generation-progress",
            &serde_json::json!({"job_id": "workout-alpha-1", "progress": 50}),
        )
        .await
        .unwrap();

    let frame = text_json(expect_message(&mut rx));
    assert_eq!(frame["event"], "workout-generation-progress");
    assert_eq!(frame["data"]["progress"], 50);
}

#[tokio::test]
async fn room_sender_broadcast_room_reaches_unregistered_connections() {
    let manager = Arc::new(WsManager::new());
    let mut rx = manager.add("conn-a".to_string()).await;

    let sender = WsRoomSender::new(Arc::clone(&manager));
    sender
        .send_to_room("broadcast", "meal-generation-started", &serde_json::json!({}))
        .await
        .unwrap();

    let frame = text_json(expect_message(&mut rx));
    assert_eq!(frame["event"], "meal-generation-started");
}

#[tokio::test]
async fn room_sender_empty_room_is_not_an_error() {
    let manager = Arc::new(WsManager::new());
    let sender = WsRoomSender::new(manager);

    let result = sender
        .send_to_room("user:nobody", "meal-generation-complete", &serde_json::json!({}))
        .await;
    assert!(result.is_ok());
}
