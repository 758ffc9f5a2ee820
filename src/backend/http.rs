//! JSON-over-HTTP client for the remote conversation service

use super::{BackendError, ConversationService, Message};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Remote conversation service reached through two JSON endpoints.
///
/// Only history reads carry a request deadline. A send waits as long as the
/// chat runtime lets it, since that is where the send bound is configured.
pub struct HttpConversationService {
    client: Client,
    base_url: String,
    history_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct HistoryRequest {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    user_message: &'a str,
}

impl HttpConversationService {
    pub fn new(base_url: &str, history_timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(history_timeout)
            .build()
            .map_err(|e| BackendError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            history_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<Req, Resp>(
        &self,
        method: &str,
        body: &Req,
        timeout: Option<Duration>,
    ) -> Result<Resp, BackendError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{method}", self.base_url);

        let mut request = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::timeout(format!("{method} timed out: {e}"))
                } else if e.is_connect() {
                    BackendError::disconnected(format!("Connection failed: {e}"))
                } else {
                    BackendError::network(format!("{method} failed: {e}"))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_status(method, status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            BackendError::invalid_response(format!("Failed to parse {method} response: {e}"))
        })
    }
}

fn classify_status(method: &str, status: StatusCode, body: &str) -> BackendError {
    let message = format!("{method} returned {status}: {}", body.trim());
    if status == StatusCode::REQUEST_TIMEOUT {
        BackendError::timeout(message)
    } else if status.is_server_error() {
        BackendError::server(message)
    } else {
        BackendError::invalid_response(message)
    }
}

#[async_trait]
impl ConversationService for HttpConversationService {
    async fn get_conversation_history(&self) -> Result<Vec<Message>, BackendError> {
        self.call(
            "getConversationHistory",
            &HistoryRequest {},
            Some(self.history_timeout),
        )
        .await
    }

    async fn send_message(&self, text: &str) -> Result<Message, BackendError> {
        self.call(
            "sendMessage",
            &SendMessageRequest { user_message: text },
            None,
        )
        .await
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}
