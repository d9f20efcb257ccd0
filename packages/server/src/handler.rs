//! WebSocket connection handlers.
//!
//! One session per connection: register, replay history, then pump frames
//! until the client goes away. The session owns the socket; the dispatcher
//! only ever sees the connection's outbound queue.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{domain::ChatMessage, state::AppState, store::MessageStore, wire::InboundChat};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Per-connection session.
///
/// Lifecycle: register the connection, replay stored history, then run a
/// read loop and a write loop until either side fails. Teardown always
/// unregisters, after which the socket must not be written to again.
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();

    // Register before replay. Broadcasts racing the replay park in the
    // outbound queue and flush after history, since the write loop only
    // starts draining once replay is done.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    state.registry.register(connection_id, tx).await;
    tracing::info!("connection {} registered", connection_id);

    // Replay history in store-return order. A store failure degrades the
    // join to an empty history; a write failure abandons the session before
    // it goes active.
    let history = match state.store.fetch_all().await {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(
                "history unavailable for connection {}: {}",
                connection_id,
                e
            );
            Vec::new()
        }
    };
    for message in &history {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("failed to serialize history message: {}", e);
                continue;
            }
        };
        if let Err(e) = sender.send(Message::Text(json.into())).await {
            tracing::warn!("replay to connection {} failed: {}", connection_id, e);
            state.registry.unregister(&connection_id).await;
            return;
        }
    }
    if !history.is_empty() {
        tracing::debug!(
            "replayed {} messages to connection {}",
            history.len(),
            connection_id
        );
    }

    // Read loop: decode inbound frames, stamp receipt time, persist in the
    // background, hand off to the dispatcher.
    let read_state = state.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::info!("connection {} read error: {}", connection_id, e);
                    break;
                }
            };

            match frame {
                Message::Text(text) => {
                    let inbound = match serde_json::from_str::<InboundChat>(&text) {
                        Ok(inbound) => inbound,
                        Err(e) => {
                            tracing::warn!(
                                "connection {} sent an unparsable payload: {}",
                                connection_id,
                                e
                            );
                            continue;
                        }
                    };

                    // The server is the timestamp authority; whatever the
                    // client put in `time` was dropped during decoding.
                    let message = inbound.into_message(read_state.clock.as_ref());

                    // Persistence is fire-and-forget. Its outcome is logged
                    // and never gates the broadcast below.
                    spawn_persist(read_state.store.clone(), message.clone());

                    if read_state.queue.send(message).is_err() {
                        tracing::error!(
                            "distribution queue closed, ending session {}",
                            connection_id
                        );
                        break;
                    }
                }
                Message::Close(_) => {
                    tracing::info!("connection {} requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Write loop: drain the outbound queue into the socket.
    let mut write_task = tokio::spawn(async move {
        while let Some(json) = rx.recv().await {
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Whichever side finishes first tears the other down.
    tokio::select! {
        _ = &mut read_task => write_task.abort(),
        _ = &mut write_task => read_task.abort(),
    }

    state.registry.unregister(&connection_id).await;
    tracing::info!("connection {} closed and unregistered", connection_id);
}

/// Persist one message in the background.
///
/// The returned handle is never awaited by the read loop; a store failure
/// is logged and the message still reaches live clients via the dispatcher.
fn spawn_persist(store: Arc<dyn MessageStore>, message: ChatMessage) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = store.append(&message).await {
            tracing::error!(
                "failed to persist message from '{}': {}",
                message.username,
                e
            );
        }
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
