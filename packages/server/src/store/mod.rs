//! Message store: durable history behind a narrow append/fetch interface.
//!
//! The store is an external collaborator with its own failure modes. Its
//! contract is deliberately decoupled from the broadcast path: an append
//! failure never delays or suppresses delivery to live connections, and a
//! failed fetch degrades a join to an empty history.

mod memory;
mod postgres;

pub use memory::InMemoryMessageStore;
pub use postgres::PostgresMessageStore;

use async_trait::async_trait;

use crate::domain::ChatMessage;

/// Errors surfaced by a message store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),
    #[error("store write failed: {0}")]
    Write(String),
    #[error("store query failed: {0}")]
    Query(String),
}

/// Durable message history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Durably store one message. Safe to call concurrently.
    async fn append(&self, message: &ChatMessage) -> Result<(), StoreError>;

    /// Full history in store-return order (insertion order, not timestamp
    /// order). No pagination.
    async fn fetch_all(&self) -> Result<Vec<ChatMessage>, StoreError>;
}
