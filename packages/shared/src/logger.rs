//! Logging setup utilities for the relay binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The default covers the calling crate and the HTTP trace layer; any of it
/// can be overridden with the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `app_name` - The crate whose events should be enabled (e.g., "banter-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
pub fn setup_logger(app_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}={level},tower_http={level}",
                    app_name.replace('-', "_"),
                    level = default_log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!(
        "logging initialized for '{}' at default level '{}'",
        app_name,
        default_log_level
    );
}
