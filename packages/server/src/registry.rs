//! Connection registry: the concurrency-safe set of live connections.

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

/// Identifier for one live connection.
pub type ConnectionId = Uuid;

/// Sending half of a connection's outbound queue. The session's write loop
/// owns the receiving half and forwards onto the socket.
pub type OutboundSender = mpsc::UnboundedSender<String>;

/// The set of currently live connections.
///
/// Sessions register and unregister themselves while the dispatcher iterates
/// for broadcast; every access goes through the internal mutex. Broadcast
/// traversal is snapshot-based: [`ConnectionRegistry::snapshot`] clones the
/// membership so the lock is never held across a send.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, OutboundSender>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. No-op if the id is already registered.
    pub async fn register(&self, id: ConnectionId, sender: OutboundSender) {
        let mut connections = self.connections.lock().await;
        connections.entry(id).or_insert(sender);
    }

    /// Remove a connection. Idempotent.
    pub async fn unregister(&self, id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(id);
    }

    /// Owned copy of the current membership, in no particular order.
    ///
    /// Each registered connection appears exactly once; registrations and
    /// removals racing the call land in the next snapshot.
    pub async fn snapshot(&self) -> Vec<(ConnectionId, OutboundSender)> {
        let connections = self.connections.lock().await;
        connections
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect()
    }

    /// Number of live connections.
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
