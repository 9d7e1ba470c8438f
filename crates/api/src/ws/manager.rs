use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use pulsefit_core::rooms::{user_room, ROOM_ADMIN};
use pulsefit_core::types::{OwnerId, Timestamp};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Owner this connection registered as, once `register-user` has
    /// been processed.
    pub owner_id: Option<OwnerId>,
    /// Rooms this connection belongs to (`user:{id}`, `admin`).
    /// Every connection is implicitly in the broadcast room.
    pub rooms: HashSet<String>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Manages all active WebSocket connections and their room membership.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc`
/// and shared across the application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller
    /// can forward messages to the WebSocket sink. The connection joins
    /// rooms only after [`register`](Self::register).
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            owner_id: None,
            rooms: HashSet::new(),
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Associate a connection with an owner: joins `user:{owner_id}`
    /// and, for admins, the `admin` room. Returns the rooms joined, or
    /// `None` if the connection is unknown.
    pub async fn register(
        &self,
        conn_id: &str,
        owner_id: &str,
        is_admin: bool,
    ) -> Option<Vec<String>> {
        let mut conns = self.connections.write().await;
        let conn = conns.get_mut(conn_id)?;

        conn.owner_id = Some(owner_id.to_string());
        conn.rooms.insert(user_room(owner_id));
        if is_admin {
            conn.rooms.insert(ROOM_ADMIN.to_string());
        }

        let mut rooms: Vec<String> = conn.rooms.iter().cloned().collect();
        rooms.sort();
        Some(rooms)
    }

    /// Send a message to one connection. Returns whether the connection
    /// exists (delivery itself is best-effort).
    pub async fn send_to_conn(&self, conn_id: &str, message: Message) -> bool {
        match self.connections.read().await.get(conn_id) {
            Some(conn) => {
                let _ = conn.sender.send(message);
                true
            }
            None => false,
        }
    }

    /// Send a message to every connection in a room.
    ///
    /// Connections whose send channels are closed are silently skipped
    /// (they will be cleaned up on their next receive loop iteration).
    /// Returns the number of connections the message was sent to.
    pub async fn send_to_room(&self, room: &str, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.rooms.contains(room) {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    /// Broadcast a message to all connected clients (the implicit
    /// broadcast room).
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
