//! Shared server state.

use std::sync::Arc;

use banter_shared::time::Clock;

use crate::dispatcher::QueueSender;
use crate::registry::ConnectionRegistry;
use crate::store::MessageStore;

/// State shared by every session handler and the dispatcher task.
pub struct AppState {
    /// Live connections; sessions register here, the dispatcher iterates.
    pub registry: Arc<ConnectionRegistry>,
    /// Producer side of the distribution queue.
    pub queue: QueueSender,
    /// Durable message history.
    pub store: Arc<dyn MessageStore>,
    /// Timestamp authority for inbound messages.
    pub clock: Arc<dyn Clock>,
}
