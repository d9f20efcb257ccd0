//! Postgres-backed message store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::domain::ChatMessage;

use super::{MessageStore, StoreError};

/// Bound on the startup connection attempt. Only startup is bounded here;
/// the pool handles reconnects for the rest of the process lifetime.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`MessageStore`] backed by a Postgres `messages` table.
///
/// History is fetched in primary-key order, i.e. insertion order as the
/// store observed it, which is the relay's defined replay order.
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// Connect to the store and make sure the schema exists.
    ///
    /// Called once at process start. A failure here is fatal to the server,
    /// since every join replays history.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id       BIGSERIAL PRIMARY KEY,
                username TEXT NOT NULL,
                text     TEXT NOT NULL,
                sent_at  TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn append(&self, message: &ChatMessage) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO messages (username, text, sent_at) VALUES ($1, $2, $3)")
            .bind(&message.username)
            .bind(&message.text)
            .bind(message.sent_at)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query("SELECT username, text, sent_at FROM messages ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                ChatMessage::new(
                    row.get("username"),
                    row.get("text"),
                    row.get::<DateTime<Utc>, _>("sent_at"),
                )
            })
            .collect())
    }
}
