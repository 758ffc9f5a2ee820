//! Pure state transition function

use super::{Effect, Event, SendState};
use crate::backend::Message;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: SendState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SendState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A message is already being sent")]
    SendInProgress,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function: same inputs, same outputs, no I/O.
pub fn transition(state: &SendState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Sending
        // ============================================================
        (SendState::Idle, Event::Submit { text, submitted_at }) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(TransitionError::EmptyMessage);
            }

            Ok(TransitionResult::new(SendState::Sending {
                pending: Message::user(text, submitted_at),
            })
            .with_effect(Effect::ClearFailure)
            .with_effect(Effect::NotifyView)
            .with_effect(Effect::dispatch_send(text)))
        }

        (SendState::Sending { .. }, Event::Submit { .. }) => Err(TransitionError::SendInProgress),

        // ============================================================
        // Settlement - always back to Idle, optimistic echo dropped
        // ============================================================

        // Refresh runs before the view is published so the echo is replaced
        // by the authoritative exchange in one step
        (SendState::Sending { .. }, Event::SendSucceeded { .. }) => {
            Ok(TransitionResult::new(SendState::Idle)
                .with_effect(Effect::InvalidateHistory)
                .with_effect(Effect::RefreshHistory)
                .with_effect(Effect::NotifyView))
        }

        (SendState::Sending { .. }, Event::SendFailed { error }) => {
            Ok(TransitionResult::new(SendState::Idle)
                .with_effect(Effect::record_failure(format!(
                    "Failed to send message: {error}"
                )))
                .with_effect(Effect::NotifyView))
        }

        (SendState::Sending { .. }, Event::SendTimedOut { after }) => {
            Ok(TransitionResult::new(SendState::Idle)
                .with_effect(Effect::record_failure(format!(
                    "Failed to send message: no reply after {}s",
                    after.as_secs()
                )))
                .with_effect(Effect::NotifyView))
        }

        // ============================================================
        // History - allowed in any state, send state unchanged
        // ============================================================

        // Local only; the server keeps its history
        (state, Event::Clear) => Ok(TransitionResult::new(state.clone())
            .with_effect(Effect::ClearLocalHistory)
            .with_effect(Effect::ClearFailure)
            .with_effect(Effect::NotifyView)),

        (state, Event::Reload) => Ok(TransitionResult::new(state.clone())
            .with_effect(Effect::InvalidateHistory)
            .with_effect(Effect::RefreshHistory)
            .with_effect(Effect::NotifyView)),

        (state, Event::Connected) => Ok(TransitionResult::new(state.clone())
            .with_effect(Effect::RefreshHistory)
            .with_effect(Effect::NotifyView)),

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with event {}",
            state.name(),
            event.kind()
        ))),
    }
}
