//! Broadcast dispatcher: the single consumer of the distribution queue.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::ChatMessage;
use crate::registry::ConnectionRegistry;

/// Producer half of the distribution queue. One per session handler.
pub type QueueSender = mpsc::UnboundedSender<ChatMessage>;

/// Create the distribution queue: many producers, exactly one consumer.
///
/// Unbounded, matching the relay's policy that session read loops never
/// block on a lagging dispatcher; a slow consumer buffers instead.
pub fn distribution_queue() -> (QueueSender, mpsc::UnboundedReceiver<ChatMessage>) {
    mpsc::unbounded_channel()
}

/// Drain the distribution queue forever, fanning each message out to every
/// registered connection.
///
/// Messages are processed strictly one at a time in enqueue order, so any
/// two messages reach every recipient in the same relative order. The loop
/// only ends when every producer is gone, which does not happen while the
/// server is serving.
pub async fn run_dispatcher(
    registry: Arc<ConnectionRegistry>,
    mut queue: mpsc::UnboundedReceiver<ChatMessage>,
) {
    while let Some(message) = queue.recv().await {
        dispatch_one(&registry, &message).await;
    }
    tracing::debug!("distribution queue closed, dispatcher exiting");
}

/// Deliver one message to every currently registered connection.
///
/// The message is serialized once and the registry is traversed as a
/// snapshot. A connection whose outbound queue is gone (its write loop
/// exited) is unregistered; the remaining deliveries are unaffected.
async fn dispatch_one(registry: &ConnectionRegistry, message: &ChatMessage) {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("failed to serialize message for broadcast: {}", e);
            return;
        }
    };

    let mut stale = Vec::new();
    for (id, sender) in registry.snapshot().await {
        if sender.send(json.clone()).is_err() {
            tracing::warn!("connection {} is gone, removing it from the registry", id);
            stale.push(id);
        }
    }
    for id in &stale {
        registry.unregister(id).await;
    }
}
