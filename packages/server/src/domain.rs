//! Domain types for the relay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message as observed by the server.
///
/// `sent_at` is assigned by the server at receipt time and serializes as the
/// RFC 3339 `time` field the browser client expects. Immutable once built;
/// messages carry no identifier and uniqueness is not required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    pub text: String,
    #[serde(rename = "time")]
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(username: String, text: String, sent_at: DateTime<Utc>) -> Self {
        Self {
            username,
            text,
            sent_at,
        }
    }
}
