//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use banter_shared::time::Clock;

use crate::{
    dispatcher::{distribution_queue, run_dispatcher},
    handler::{health_check, websocket_handler},
    registry::ConnectionRegistry,
    signal::shutdown_signal,
    state::AppState,
    store::MessageStore,
};

/// Build the application state and router, spawning the dispatcher task.
///
/// Split out from [`run_server`] so the test suite can serve the app on an
/// ephemeral listener with its own store and clock.
pub fn build_app(store: Arc<dyn MessageStore>, clock: Arc<dyn Clock>) -> (Router, Arc<AppState>) {
    let registry = Arc::new(ConnectionRegistry::new());
    let (queue_tx, queue_rx) = distribution_queue();

    tokio::spawn(run_dispatcher(registry.clone(), queue_rx));

    let state = Arc::new(AppState {
        registry,
        queue: queue_tx,
        store,
        clock,
    });

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    (app, state)
}

/// Run the message relay server
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 8080)
/// * `store` - The connected message store used for history
pub async fn run_server(
    host: String,
    port: u16,
    store: Arc<dyn MessageStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (app, _state) = build_app(store, Arc::new(banter_shared::time::SystemClock));

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("message relay listening on {}", listener.local_addr()?);
    tracing::info!("Connect to: ws://{}/ws", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
