//! Query/cache layer over the remote conversation service
//!
//! Wraps the two remote operations with request de-duplication, cache
//! invalidation and a connection slot. The conversation history lives in a
//! keyed cache under a single fixed key.

mod cache;

pub use cache::QueryCache;

use crate::backend::{BackendError, BackendErrorKind, ConversationService, Message};
use futures::FutureExt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Cache keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    ConversationHistory,
}

impl QueryKey {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKey::ConversationHistory => "conversationHistory",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("Not connected to the conversation service")]
    Disconnected,
    #[error("Message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl QueryError {
    /// True for both "never connected" and "endpoint unreachable"
    pub fn is_disconnected(&self) -> bool {
        match self {
            QueryError::Disconnected => true,
            QueryError::Backend(e) => e.kind == BackendErrorKind::Disconnected,
            QueryError::EmptyMessage => false,
        }
    }
}

/// Client-side query layer
pub struct QueryClient {
    service: RwLock<Option<Arc<dyn ConversationService>>>,
    cache: QueryCache<QueryKey, Vec<Message>, BackendError>,
}

impl QueryClient {
    /// Create a client with no remote channel attached yet
    pub fn new() -> Self {
        Self {
            service: RwLock::new(None),
            cache: QueryCache::new(),
        }
    }

    #[allow(dead_code)] // Used by tests
    pub fn with_service(service: Arc<dyn ConversationService>) -> Self {
        let client = Self::new();
        client.connect(service);
        client
    }

    /// Attach the remote channel; cached history is marked stale
    pub fn connect(&self, service: Arc<dyn ConversationService>) {
        tracing::info!(backend = %service.name(), "Conversation service connected");
        *self
            .service
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(service);
        self.cache.invalidate(&QueryKey::ConversationHistory);
    }

    #[allow(dead_code)] // Used when tearing down a channel in tests
    pub fn disconnect(&self) {
        *self
            .service
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_connected(&self) -> bool {
        self.service
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn service(&self) -> Option<Arc<dyn ConversationService>> {
        self.service
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the conversation history, from cache while it is fresh
    pub async fn fetch_history(&self) -> Result<Vec<Message>, QueryError> {
        let service = self.service().ok_or(QueryError::Disconnected)?;

        self.cache
            .fetch_with(QueryKey::ConversationHistory, move || {
                async move { service.get_conversation_history().await }.boxed()
            })
            .await
            .map_err(QueryError::from)
    }

    /// Send a user message; on success the cached history is invalidated
    pub async fn send_message(&self, text: &str) -> Result<Message, QueryError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QueryError::EmptyMessage);
        }
        let service = self.service().ok_or(QueryError::Disconnected)?;

        let reply = service.send_message(text).await?;
        self.invalidate_history();
        Ok(reply)
    }

    /// Cached history without fetching
    pub fn cached_history(&self) -> Option<Vec<Message>> {
        self.cache.get(&QueryKey::ConversationHistory)
    }

    #[allow(dead_code)] // Used by tests
    pub fn has_fresh_history(&self) -> bool {
        self.cache.is_fresh(&QueryKey::ConversationHistory)
    }

    pub fn invalidate_history(&self) {
        if self.cache.invalidate(&QueryKey::ConversationHistory) {
            tracing::debug!(key = QueryKey::ConversationHistory.as_str(), "Cache invalidated");
        }
    }

    /// Reset the displayed history to empty. The server is not informed.
    pub fn clear_local(&self) {
        self.cache
            .set_data(QueryKey::ConversationHistory, Vec::new());
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}
