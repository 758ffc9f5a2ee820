//! Remote conversation service abstraction
//!
//! The backend owns message storage and reply generation; the client only
//! ever reads the full history or appends a user message.

mod error;
mod http;
mod types;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpConversationService;
pub use types::{timestamp_now, Message, Role};

use async_trait::async_trait;
use std::sync::Arc;

/// The two-method remote contract
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Fetch the full ordered conversation history
    async fn get_conversation_history(&self) -> Result<Vec<Message>, BackendError>;

    /// Append a user message and return the generated assistant reply
    async fn send_message(&self, text: &str) -> Result<Message, BackendError>;

    /// Identifier used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ConversationService + ?Sized> ConversationService for Arc<T> {
    async fn get_conversation_history(&self) -> Result<Vec<Message>, BackendError> {
        (**self).get_conversation_history().await
    }

    async fn send_message(&self, text: &str) -> Result<Message, BackendError> {
        (**self).send_message(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logging wrapper for conversation services
pub struct LoggingService {
    inner: Arc<dyn ConversationService>,
    name: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn ConversationService>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl ConversationService for LoggingService {
    async fn get_conversation_history(&self) -> Result<Vec<Message>, BackendError> {
        let start = std::time::Instant::now();
        let result = self.inner.get_conversation_history().await;
        let duration = start.elapsed();

        match &result {
            Ok(messages) => {
                tracing::info!(
                    backend = %self.name,
                    duration_ms = %duration.as_millis(),
                    messages = messages.len(),
                    "History fetched"
                );
            }
            Err(e) => {
                tracing::error!(
                    backend = %self.name,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "History fetch failed"
                );
            }
        }

        result
    }

    async fn send_message(&self, text: &str) -> Result<Message, BackendError> {
        let start = std::time::Instant::now();
        let result = self.inner.send_message(text).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    backend = %self.name,
                    duration_ms = %duration.as_millis(),
                    chars = text.chars().count(),
                    has_game = reply.has_game(),
                    "Message sent"
                );
            }
            Err(e) => {
                tracing::error!(
                    backend = %self.name,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Message send failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
