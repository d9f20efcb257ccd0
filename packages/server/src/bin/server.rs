//! WebSocket message relay server.
//!
//! Receives messages from clients, persists them, and broadcasts them to
//! every connected client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin banter-server
//! cargo run --bin banter-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use banter_server::{run_server, store::PostgresMessageStore};
use banter_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "banter-server")]
#[command(about = "Real-time WebSocket message relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Postgres connection string for the message store
    #[arg(long, default_value = "postgres://127.0.0.1:5432/banter")]
    database_url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_PKG_NAME"), "info");

    let args = Args::parse();

    // The store connection is established once, up front. Every join replays
    // history, so the server does not start without it.
    let store: Arc<PostgresMessageStore> =
        match PostgresMessageStore::connect(&args.database_url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("could not connect to the message store: {}", e);
                std::process::exit(1);
            }
        };
    tracing::info!("connected to message store");

    if let Err(e) = run_server(args.host, args.port, store).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
