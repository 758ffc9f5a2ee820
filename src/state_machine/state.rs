//! Send controller state

use crate::backend::Message;
use serde::Serialize;

/// Per-send state.
///
/// The optimistic echo lives inside `Sending`, so there can never be more
/// than one of them and it cannot outlive the send it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SendState {
    /// Ready for user input
    #[default]
    Idle,

    /// Remote send in flight; input is disabled
    Sending {
        /// The user message shown before the server confirms it
        pending: Message,
    },
}

impl SendState {
    pub fn is_sending(&self) -> bool {
        matches!(self, SendState::Sending { .. })
    }

    pub fn pending(&self) -> Option<&Message> {
        match self {
            SendState::Idle => None,
            SendState::Sending { pending } => Some(pending),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SendState::Idle => "idle",
            SendState::Sending { .. } => "sending",
        }
    }
}
