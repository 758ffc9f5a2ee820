//! API request and response types

use crate::backend::{Message, Role};
use crate::game::{GameDescriptor, GameKind};
use crate::runtime::ChatView;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// Response for an accepted send
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Request to resolve a raw game payload
#[derive(Debug, Deserialize)]
pub struct ResolveGameRequest {
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveGameResponse {
    pub kind: GameKind,
    pub title: String,
    pub playable: bool,
}

impl From<GameDescriptor> for ResolveGameResponse {
    fn from(game: GameDescriptor) -> Self {
        Self {
            playable: game.is_playable(),
            kind: game.kind,
            title: game.title,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GameFrameQuery {
    #[serde(default)]
    pub expanded: bool,
}

/// A message as the browser renders it
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// The timestamp as a string, since it exceeds JavaScript's safe integers
    pub id: String,
    pub content: String,
    pub role: Role,
    pub timestamp: i64,
    /// Local `HH:MM`
    pub time: String,
    pub has_game: bool,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.timestamp.to_string(),
            time: message.display_time(),
            has_game: message.has_game(),
            content: message.content,
            role: message.role,
            timestamp: message.timestamp,
        }
    }
}

/// The conversation view as sent to the browser
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub messages: Vec<MessageResponse>,
    pub is_loading_history: bool,
    pub is_typing: bool,
    pub input_enabled: bool,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<ChatView> for ConversationResponse {
    fn from(view: ChatView) -> Self {
        Self {
            messages: view.messages.into_iter().map(MessageResponse::from).collect(),
            is_loading_history: view.is_loading_history,
            is_typing: view.is_typing,
            input_enabled: view.input_enabled,
            connected: view.connected,
            last_error: view.last_error,
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
