//! Chat runtime executor

use super::{ChatHandle, ChatView, Command, RuntimeConfig, ViewEvent};
use crate::query::QueryClient;
use crate::state_machine::{transition, Effect, Event, SendState, TransitionError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Owns the send state and executes effects
pub struct ChatRuntime {
    state: SendState,
    query: Arc<QueryClient>,
    config: RuntimeConfig,
    command_rx: mpsc::Receiver<Command>,
    /// Weak so the loop ends once every handle and in-flight send is gone
    command_tx: mpsc::WeakSender<Command>,
    view_tx: watch::Sender<ChatView>,
    broadcast_tx: broadcast::Sender<ViewEvent>,
    last_error: Option<String>,
    loading_history: bool,
}

impl ChatRuntime {
    /// Start the runtime on the current tokio runtime
    pub fn spawn(query: Arc<QueryClient>, config: RuntimeConfig) -> ChatHandle {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (view_tx, view_rx) = watch::channel(ChatView {
            messages: Vec::new(),
            is_loading_history: true,
            is_typing: false,
            input_enabled: true,
            connected: query.is_connected(),
            last_error: None,
        });

        let runtime = ChatRuntime {
            state: SendState::Idle,
            query: query.clone(),
            config,
            command_rx,
            command_tx: command_tx.downgrade(),
            view_tx,
            broadcast_tx: broadcast_tx.clone(),
            last_error: None,
            loading_history: true,
        };

        tokio::spawn(runtime.run());

        ChatHandle {
            command_tx,
            view_rx,
            broadcast_tx,
            query,
        }
    }

    async fn run(mut self) {
        tracing::info!("Starting chat runtime");

        // A channel attached before spawn still needs its first history load
        if self.query.is_connected() {
            if let Err(e) = self.process_event(Event::Connected).await {
                tracing::error!(error = %e, "Failed to load initial history");
            }
        }

        while let Some(command) = self.command_rx.recv().await {
            let kind = command.event.kind();
            let result = self.process_event(command.event).await;

            match command.reply {
                Some(reply) => {
                    let _ = reply.send(result);
                }
                None => {
                    if let Err(e) = result {
                        tracing::warn!(event = kind, error = %e, "Dropped event");
                    }
                }
            }
        }

        tracing::info!("Chat runtime stopped");
    }

    async fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let kind = event.kind();
        if let Event::SendSucceeded { reply } = &event {
            tracing::debug!(
                chars = reply.content.chars().count(),
                has_game = reply.has_game(),
                "Reply received"
            );
        }
        let result = transition(&self.state, event)?;

        tracing::debug!(
            event = kind,
            from = self.state.name(),
            to = result.new_state.name(),
            "Transition"
        );
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect).await;
        }

        Ok(())
    }

    async fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::DispatchSend { text } => self.dispatch_send(text),

            Effect::InvalidateHistory => self.query.invalidate_history(),

            Effect::RefreshHistory => self.refresh_history().await,

            Effect::ClearLocalHistory => {
                tracing::info!("Clearing local conversation view");
                self.query.clear_local();
            }

            Effect::RecordFailure { message } => {
                tracing::error!(error = %message, "Send failed");
                let _ = self.broadcast_tx.send(ViewEvent::Error {
                    message: message.clone(),
                });
                self.last_error = Some(message);
            }

            Effect::ClearFailure => self.last_error = None,

            Effect::NotifyView => self.publish(),
        }
    }

    /// Run the remote send on its own task so the loop keeps serving views
    fn dispatch_send(&self, text: String) {
        let Some(command_tx) = self.command_tx.upgrade() else {
            tracing::warn!("No handles left, dropping send");
            return;
        };
        let query = self.query.clone();
        let send_timeout = self.config.send_timeout;

        tokio::spawn(async move {
            let outcome = match send_timeout {
                Some(limit) => tokio::time::timeout(limit, query.send_message(&text))
                    .await
                    .map_err(|_| limit),
                None => Ok(query.send_message(&text).await),
            };

            let event = match outcome {
                Ok(Ok(reply)) => Event::SendSucceeded { reply },
                Ok(Err(error)) => Event::SendFailed { error },
                Err(after) => Event::SendTimedOut { after },
            };

            if command_tx.send(Command::internal(event)).await.is_err() {
                tracing::warn!("Chat runtime gone before send settled");
            }
        });
    }

    async fn refresh_history(&mut self) {
        if self.query.cached_history().is_none() {
            self.loading_history = true;
            self.publish();
        }

        self.loading_history = match self.query.fetch_history().await {
            Ok(messages) => {
                tracing::debug!(count = messages.len(), "History refreshed");
                false
            }
            // Shown as an empty conversation with the loading indicator
            Err(e) if e.is_disconnected() => {
                tracing::warn!(error = %e, "History unavailable while disconnected");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "History refresh failed");
                self.last_error = Some(format!("Failed to load conversation: {e}"));
                false
            }
        };
    }

    fn build_view(&self) -> ChatView {
        let mut messages = self.query.cached_history().unwrap_or_default();
        if let Some(pending) = self.state.pending() {
            messages.push(pending.clone());
        }

        let connected = self.query.is_connected();
        let is_typing = self.state.is_sending();

        ChatView {
            messages,
            is_loading_history: self.loading_history || !connected,
            is_typing,
            input_enabled: !is_typing,
            connected,
            last_error: self.last_error.clone(),
        }
    }

    fn publish(&self) {
        let view = self.build_view();
        let _ = self.broadcast_tx.send(ViewEvent::View(view.clone()));
        self.view_tx.send_replace(view);
    }
}
