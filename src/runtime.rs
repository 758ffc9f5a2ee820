//! Runtime for the conversation controller
//!
//! A single task owns the send state and executes the effects the state
//! machine produces. Callers talk to it through a cloneable [`ChatHandle`];
//! views observe it through a `watch` snapshot and a `broadcast` event feed.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ChatRuntime;

use crate::backend::{timestamp_now, ConversationService, Message};
use crate::query::QueryClient;
use crate::state_machine::{Event, TransitionError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Default bound on a single remote send
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(120);

/// Runtime tuning
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// `None` waits forever for a reply
    pub send_timeout: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            send_timeout: Some(DEFAULT_SEND_TIMEOUT),
        }
    }
}

/// Everything a view needs to render the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatView {
    /// Server history followed by the optimistic echo, if any
    pub messages: Vec<Message>,
    pub is_loading_history: bool,
    pub is_typing: bool,
    pub input_enabled: bool,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Events pushed to live views
#[derive(Debug, Clone)]
pub enum ViewEvent {
    View(ChatView),
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Chat runtime stopped")]
    Stopped,
}

/// An event plus an optional acknowledgement channel
pub(crate) struct Command {
    event: Event,
    reply: Option<oneshot::Sender<Result<(), TransitionError>>>,
}

impl Command {
    fn internal(event: Event) -> Self {
        Self { event, reply: None }
    }
}

/// Handle to interact with a running chat runtime
#[derive(Clone)]
pub struct ChatHandle {
    command_tx: mpsc::Sender<Command>,
    view_rx: watch::Receiver<ChatView>,
    broadcast_tx: broadcast::Sender<ViewEvent>,
    query: Arc<QueryClient>,
}

impl ChatHandle {
    async fn submit(&self, event: Event) -> Result<(), ChatError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| ChatError::Stopped)?;

        reply_rx.await.map_err(|_| ChatError::Stopped)??;
        Ok(())
    }

    /// Start sending `text`. Returns once the optimistic echo is visible;
    /// the outcome arrives later through the view.
    pub async fn send_message(&self, text: &str) -> Result<(), ChatError> {
        self.submit(Event::Submit {
            text: text.to_string(),
            submitted_at: timestamp_now(),
        })
        .await
    }

    /// Empty the displayed history. The server is not informed.
    pub async fn clear_conversation(&self) -> Result<(), ChatError> {
        self.submit(Event::Clear).await
    }

    /// Drop the cache and re-read history from the server
    pub async fn reload(&self) -> Result<(), ChatError> {
        self.submit(Event::Reload).await
    }

    /// Attach a remote channel and load history through it
    pub async fn connect(&self, service: Arc<dyn ConversationService>) -> Result<(), ChatError> {
        self.query.connect(service);
        self.submit(Event::Connected).await
    }

    /// Latest published snapshot
    pub fn view(&self) -> ChatView {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Wait until a published snapshot satisfies `predicate`
    #[allow(dead_code)] // Used by tests
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&ChatView) -> bool,
    ) -> Result<ChatView, ChatError> {
        let mut rx = self.view_rx.clone();
        let view = rx.wait_for(predicate).await.map_err(|_| ChatError::Stopped)?;
        Ok(view.clone())
    }
}
