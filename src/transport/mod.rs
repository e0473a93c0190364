pub mod http;
pub mod rate_limit;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::chat::{ ChatMessage, ConversationSummary, SendRequest, SendResponse };

pub use self::http::HttpTransport;
pub use self::rate_limit::RateLimitPolicy;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api/gemini/chat";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx answer; `body` is the raw response text, where the backend
    /// reports quota exhaustion.
    #[error("{}", status_message(.status, .body))]
    Status {
        status: u16,
        body: String,
    },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

fn status_message(status: &u16, body: &str) -> String {
    if body.trim().is_empty() { format!("HTTP {}", status) } else { body.to_string() }
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status { status: status.as_u16(), body: String::new() }
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

/// The chat backend as seen by the widget.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn list_conversations(
        &self,
        user_id: &str
    ) -> Result<Vec<ConversationSummary>, TransportError>;

    async fn load_messages(&self, conversation_id: i64) -> Result<Vec<ChatMessage>, TransportError>;

    async fn send(&self, request: &SendRequest) -> Result<SendResponse, TransportError>;

    async fn delete_conversation(&self, conversation_id: i64) -> Result<(), TransportError>;
}
