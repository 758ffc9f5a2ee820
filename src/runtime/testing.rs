//! Mock implementations for testing
//!
//! These mocks enable integration testing of the runtime without real I/O.

use super::{ChatHandle, ChatRuntime, ChatView, RuntimeConfig, ViewEvent};
use crate::backend::{BackendError, ConversationService, Message};
use crate::query::QueryClient;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

// ============================================================================
// Mock Conversation Service
// ============================================================================

/// In-memory stand-in for the remote service.
///
/// Successful sends append the user message and a generated reply to the
/// server-side history, the way the real backend does.
pub struct MockConversationService {
    history: Mutex<Vec<Message>>,
    failures: Mutex<VecDeque<BackendError>>,
    next_game_payload: Mutex<Option<String>>,
    sent: Mutex<Vec<String>>,
    history_calls: AtomicUsize,
    clock: AtomicI64,
    /// When set, each send waits for a permit before answering
    gate: Option<Arc<Semaphore>>,
    /// Notified when a send reaches the service
    pub send_started: Arc<Notify>,
}

impl MockConversationService {
    pub fn new() -> Self {
        Self::with_history(Vec::new())
    }

    pub fn with_history(history: Vec<Message>) -> Self {
        let clock = history.iter().map(|m| m.timestamp).max().unwrap_or(0);
        Self {
            history: Mutex::new(history),
            failures: Mutex::new(VecDeque::new()),
            next_game_payload: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            history_calls: AtomicUsize::new(0),
            clock: AtomicI64::new(clock),
            gate: None,
            send_started: Arc::new(Notify::new()),
        }
    }

    /// Sends block until `release_send` is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release_send(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Make the next send fail with `error`
    pub fn fail_next_send(&self, error: BackendError) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Attach a game payload to the next reply
    pub fn reply_with_game(&self, payload: impl Into<String>) {
        *self.next_game_payload.lock().unwrap() = Some(payload.into());
    }

    pub fn server_history(&self) -> Vec<Message> {
        self.history.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    fn tick(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Default for MockConversationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationService for MockConversationService {
    async fn get_conversation_history(&self) -> Result<Vec<Message>, BackendError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.server_history())
    }

    async fn send_message(&self, text: &str) -> Result<Message, BackendError> {
        self.sent.lock().unwrap().push(text.to_string());
        self.send_started.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| BackendError::network("gate closed"))?
                .forget();
        }

        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let user = Message::user(text, self.tick());
        let mut reply = Message::assistant(format!("Reply to: {text}"), self.tick());
        reply.game_payload = self.next_game_payload.lock().unwrap().take();

        let mut history = self.history.lock().unwrap();
        history.push(user);
        history.push(reply.clone());
        Ok(reply)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

const WAIT: Duration = Duration::from_secs(2);

/// Helper for building test runtimes with minimal boilerplate
pub struct TestRuntime {
    pub service: Arc<MockConversationService>,
    pub handle: ChatHandle,
}

pub struct TestRuntimeBuilder {
    service: Option<MockConversationService>,
    config: RuntimeConfig,
    connected: bool,
}

impl TestRuntime {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> TestRuntimeBuilder {
        TestRuntimeBuilder {
            service: None,
            config: RuntimeConfig::default(),
            connected: true,
        }
    }

    /// Wait until history is loaded and no send is outstanding
    pub async fn settled(&self) -> ChatView {
        tokio::time::timeout(
            WAIT,
            self.handle
                .wait_for(|v| !v.is_typing && !v.is_loading_history),
        )
        .await
        .expect("runtime did not settle")
        .expect("runtime stopped")
    }

    pub async fn wait_for(&self, predicate: impl FnMut(&ChatView) -> bool) -> ChatView {
        tokio::time::timeout(WAIT, self.handle.wait_for(predicate))
            .await
            .expect("condition not reached")
            .expect("runtime stopped")
    }
}

impl TestRuntimeBuilder {
    pub fn service(mut self, service: MockConversationService) -> Self {
        self.service = Some(service);
        self
    }

    pub fn send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    /// Start without a remote channel attached
    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    pub fn build(self) -> TestRuntime {
        let service = Arc::new(self.service.unwrap_or_default());
        let query = Arc::new(QueryClient::new());
        if self.connected {
            query.connect(service.clone());
        }

        let handle = ChatRuntime::spawn(query, self.config);

        TestRuntime { service, handle }
    }
}

/// Collect view snapshots until one has `is_typing == false` after a typing one
async fn collect_until_settled(rx: &mut tokio::sync::broadcast::Receiver<ViewEvent>) -> Vec<ChatView> {
    let mut views = Vec::new();
    let mut saw_typing = false;
    loop {
        match tokio::time::timeout(WAIT, rx.recv()).await {
            Ok(Ok(ViewEvent::View(view))) => {
                saw_typing |= view.is_typing;
                let done = saw_typing && !view.is_typing;
                views.push(view);
                if done {
                    return views;
                }
            }
            Ok(Ok(ViewEvent::Error { .. })) => continue,
            _ => return views,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Role;
    use crate::runtime::ChatError;
    use crate::state_machine::TransitionError;

    fn seeded_service() -> MockConversationService {
        MockConversationService::with_history(vec![
            Message::user("What are the best open-world games?", 10),
            Message::assistant("Breath of the Wild, Elden Ring, Witcher 3.", 11),
        ])
    }

    fn contents(messages: &[Message]) -> Vec<(Role, String)> {
        messages
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_initial_history_is_loaded() {
        let rt = TestRuntime::new().service(seeded_service()).build();
        let view = rt.settled().await;

        assert_eq!(view.messages.len(), 2);
        assert!(view.connected);
        assert!(view.input_enabled);
    }

    #[tokio::test]
    async fn test_successful_send_appends_exchange_once() {
        let rt = TestRuntime::new().service(seeded_service()).build();
        let before = rt.settled().await.messages;

        rt.handle.send_message("Tips for Dark Souls beginners?").await.unwrap();
        let after = rt.settled().await;

        let mut expected = contents(&before);
        expected.push((Role::User, "Tips for Dark Souls beginners?".to_string()));
        expected.push((
            Role::Assistant,
            "Reply to: Tips for Dark Souls beginners?".to_string(),
        ));
        assert_eq!(contents(&after.messages), expected);
        assert_eq!(after.messages, rt.service.server_history());
        assert!(after.last_error.is_none());
    }

    #[tokio::test]
    async fn test_optimistic_echo_visible_while_sending() {
        let rt = TestRuntime::new().service(seeded_service().gated()).build();
        rt.settled().await;

        rt.handle.send_message("  Make a puzzle game ").await.unwrap();
        let view = rt.handle.view();

        assert!(view.is_typing);
        assert!(!view.input_enabled);
        assert_eq!(view.messages.len(), 3);
        let echo = view.messages.last().unwrap();
        assert_eq!(echo.role, Role::User);
        assert_eq!(echo.content, "Make a puzzle game");

        rt.service.release_send();
        let settled = rt.settled().await;
        assert_eq!(settled.messages.len(), 4);
        assert_eq!(
            settled
                .messages
                .iter()
                .filter(|m| m.content == "Make a puzzle game")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_failed_send_restores_history_before() {
        let rt = TestRuntime::new().service(seeded_service()).build();
        let before = rt.settled().await.messages;

        rt.service
            .fail_next_send(BackendError::server("canister trapped"));
        rt.handle.send_message("Build a tower defense game").await.unwrap();
        let after = rt.settled().await;

        assert_eq!(after.messages, before);
        assert!(!after.is_typing);
        assert!(after.input_enabled);
        assert!(after
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("canister trapped")));
        // The cached history was not refetched
        assert_eq!(rt.service.history_calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_send_is_rejected() {
        let rt = TestRuntime::new().service(seeded_service().gated()).build();
        rt.settled().await;

        rt.handle.send_message("first").await.unwrap();
        let second = rt.handle.send_message("second").await;
        assert!(matches!(
            second,
            Err(ChatError::Rejected(TransitionError::SendInProgress))
        ));

        rt.service.release_send();
        rt.settled().await;
        assert_eq!(rt.service.sent_messages(), vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let rt = TestRuntime::new().build();
        rt.settled().await;

        let result = rt.handle.send_message("   ").await;
        assert!(matches!(
            result,
            Err(ChatError::Rejected(TransitionError::EmptyMessage))
        ));
        assert!(rt.service.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_input_reenabled_exactly_once_per_send() {
        let rt = TestRuntime::new().service(seeded_service().gated()).build();
        rt.settled().await;
        let mut rx = rt.handle.subscribe();

        rt.handle.send_message("Create a racing game").await.unwrap();
        rt.service.send_started.notified().await;
        rt.service.release_send();

        let views = collect_until_settled(&mut rx).await;
        let enabled: Vec<bool> = views.iter().map(|v| v.input_enabled).collect();

        assert_eq!(enabled.first(), Some(&false));
        assert_eq!(enabled.last(), Some(&true));
        let reenabled = enabled.windows(2).filter(|w| !w[0] && w[1]).count();
        assert_eq!(reenabled, 1);
    }

    #[tokio::test]
    async fn test_failed_send_also_reenables_input_once() {
        let rt = TestRuntime::new().service(seeded_service()).build();
        rt.settled().await;
        let mut rx = rt.handle.subscribe();

        rt.service.fail_next_send(BackendError::network("reset"));
        rt.handle.send_message("Explain speedrunning").await.unwrap();

        let views = collect_until_settled(&mut rx).await;
        let enabled: Vec<bool> = views.iter().map(|v| v.input_enabled).collect();
        assert_eq!(enabled, vec![false, true]);
    }

    #[tokio::test]
    async fn test_hung_send_times_out() {
        let rt = TestRuntime::new()
            .service(seeded_service().gated())
            .send_timeout(Some(Duration::from_millis(50)))
            .build();
        let before = rt.settled().await.messages;

        rt.handle.send_message("Are you there?").await.unwrap();
        let after = rt.settled().await;

        assert_eq!(after.messages, before);
        assert!(after.last_error.as_deref().is_some_and(|e| e.contains("no reply")));
    }

    #[tokio::test]
    async fn test_clear_is_local_and_reload_restores() {
        let rt = TestRuntime::new().service(seeded_service()).build();
        let before = rt.settled().await.messages;
        assert_eq!(before.len(), 2);

        rt.handle.clear_conversation().await.unwrap();
        assert!(rt.handle.view().messages.is_empty());
        assert_eq!(rt.service.server_history().len(), 2);

        rt.handle.reload().await.unwrap();
        assert_eq!(rt.handle.view().messages, before);
    }

    #[tokio::test]
    async fn test_clear_while_sending_keeps_echo() {
        let rt = TestRuntime::new().service(seeded_service().gated()).build();
        rt.settled().await;

        rt.handle.send_message("Make me a Snake game").await.unwrap();
        rt.handle.clear_conversation().await.unwrap();

        let view = rt.handle.view();
        assert_eq!(contents(&view.messages), vec![(Role::User, "Make me a Snake game".to_string())]);
        assert!(view.is_typing);

        rt.service.release_send();
        let settled = rt.settled().await;
        // Success refetches, so the server's full history comes back
        assert_eq!(settled.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_disconnected_shows_empty_loading_until_connect() {
        let rt = TestRuntime::new().service(seeded_service()).disconnected().build();

        let view = rt.handle.view();
        assert!(view.messages.is_empty());
        assert!(view.is_loading_history);
        assert!(!view.connected);

        rt.handle.connect(rt.service.clone()).await.unwrap();
        let view = rt.settled().await;
        assert!(view.connected);
        assert_eq!(view.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_send_while_disconnected_fails_cleanly() {
        let rt = TestRuntime::new().disconnected().build();

        rt.handle.send_message("hello?").await.unwrap();
        let view = rt.wait_for(|v| !v.is_typing).await;

        assert!(view.messages.is_empty());
        assert!(view.last_error.is_some());
    }

    #[tokio::test]
    async fn test_reply_with_game_payload_reaches_view() {
        let rt = TestRuntime::new().build();
        rt.settled().await;

        rt.service.reply_with_game(r#"{"gameType":"tetris"}"#);
        rt.handle.send_message("Make a Tetris game").await.unwrap();
        let view = rt.settled().await;

        let reply = view.messages.last().unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert!(reply.has_game());
    }

    #[tokio::test]
    async fn test_mock_service_records_exchange() {
        let mock = MockConversationService::new();
        let reply = mock.send_message("hi").await.unwrap();

        assert_eq!(reply.content, "Reply to: hi");
        let history = mock.get_conversation_history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].timestamp < history[1].timestamp);
        assert_eq!(mock.history_calls(), 1);
    }
}
