//! In-memory store implementation.
//!
//! Keeps the full history in a `Vec` behind a mutex. Used by the test suite
//! and handy for running the relay without a database at hand.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ChatMessage;

use super::{MessageStore, StoreError};

/// Insertion-ordered in-memory implementation of [`MessageStore`].
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: &ChatMessage) -> Result<(), StoreError> {
        let mut messages = self.messages.lock().await;
        messages.push(message.clone());
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<ChatMessage>, StoreError> {
        let messages = self.messages.lock().await;
        Ok(messages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message(text: &str) -> ChatMessage {
        ChatMessage::new(
            "alice".to_string(),
            text.to_string(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_fetch_all_on_empty_store() {
        // given:
        let store = InMemoryMessageStore::new();

        // when:
        let history = store.fetch_all().await.unwrap();

        // then:
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_insertion_order() {
        // given:
        let store = InMemoryMessageStore::new();
        store.append(&message("first")).await.unwrap();
        store.append(&message("second")).await.unwrap();
        store.append(&message("third")).await.unwrap();

        // when:
        let history = store.fetch_all().await.unwrap();

        // then:
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }
}
