//! WebSocket wire DTOs.
//!
//! Clients submit `{"username": ..., "text": ...}` and receive the same
//! shape plus a server-stamped `time` field. A `time` sent by a client is
//! an unknown field to the inbound DTO and is dropped during decoding; the
//! server is the timestamp authority.

use serde::Deserialize;

use banter_shared::time::Clock;

use crate::domain::ChatMessage;

/// Inbound chat payload from a client.
#[derive(Debug, Deserialize)]
pub struct InboundChat {
    pub username: String,
    pub text: String,
}

impl InboundChat {
    /// Stamp the payload with the server's receipt time.
    pub fn into_message(self, clock: &dyn Clock) -> ChatMessage {
        ChatMessage::new(self.username, self.text, clock.now())
    }
}
