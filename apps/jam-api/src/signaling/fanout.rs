//! Broadcast hub for routing signaling events to connected clients.
//!
//! A single `tokio::sync::broadcast` channel carries every outbound event;
//! each connection's loop filters by recipient. Recipients are resolved to
//! explicit connection ids when the event is emitted, so multicast-group
//! membership is decided under the relay lock and cannot drift from registry
//! state by the time the frame is delivered.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel. Sends are fire-and-forget; receivers
/// that fall behind skip messages (RecvError::Lagged).
const BROADCAST_CAPACITY: usize = 4096;

/// Who should receive an outbound event.
#[derive(Debug, Clone)]
pub enum Recipient {
    /// Every connected client.
    All,
    /// A single connection.
    One(String),
    /// An explicit set of connections, e.g. a session's multicast group.
    Many(Vec<String>),
}

impl Recipient {
    /// Whether the given connection should receive the event.
    pub fn includes(&self, connection_id: &str) -> bool {
        match self {
            Recipient::All => true,
            Recipient::One(id) => id == connection_id,
            Recipient::Many(ids) => ids.iter().any(|id| id == connection_id),
        }
    }
}

/// An event on its way to one or more connections.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub recipient: Recipient,
    pub event: &'static str,
    pub data: Value,
}

/// The global outbound hub. Cloneable — store in AppState.
#[derive(Clone)]
pub struct SignalingBroadcast {
    sender: broadcast::Sender<Arc<Outbound>>,
}

impl SignalingBroadcast {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the outbound stream. Each connection loop calls this once
    /// before it starts handling traffic.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Outbound>> {
        self.sender.subscribe()
    }

    /// Send an event toward its recipients. send() returns Err only when
    /// there are no receivers — that's fine.
    pub fn send(&self, recipient: Recipient, event: &'static str, data: Value) {
        let _ = self.sender.send(Arc::new(Outbound {
            recipient,
            event,
            data,
        }));
    }
}

impl Default for SignalingBroadcast {
    fn default() -> Self {
        Self::new()
    }
}
