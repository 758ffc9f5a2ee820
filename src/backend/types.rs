//! Wire types shared with the remote conversation service

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message as stored by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content: String,
    pub role: Role,
    /// Nanoseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_payload: Option<String>,
}

impl Message {
    /// Locally synthesized user message, shown before the server confirms it
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            content: content.into(),
            role: Role::User,
            timestamp,
            game_payload: None,
        }
    }

    #[allow(dead_code)] // Used by the mock services and tests
    pub fn assistant(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            content: content.into(),
            role: Role::Assistant,
            timestamp,
            game_payload: None,
        }
    }

    #[must_use]
    #[allow(dead_code)] // Used by the mock services and tests
    pub fn with_game_payload(mut self, payload: impl Into<String>) -> Self {
        self.game_payload = Some(payload.into());
        self
    }

    pub fn has_game(&self) -> bool {
        self.game_payload.as_deref().is_some_and(|p| !p.trim().is_empty())
    }

    /// Local wall-clock `HH:MM` for the bubble footer
    pub fn display_time(&self) -> String {
        DateTime::<Utc>::from_timestamp_nanos(self.timestamp)
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}

/// Current wall-clock time in nanoseconds since the epoch
pub fn timestamp_now() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}
