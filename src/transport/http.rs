use async_trait::async_trait;
use log::{ debug, error };
use reqwest::{ Client, Response };
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::{ form_urlencoded, Url };

use super::{ ChatTransport, TransportError };
use crate::models::chat::{
    ChatMessage,
    ConversationSummary,
    SendRequest,
    SendResponse,
    StoredTurn,
};

/// Thin reqwest wrapper around the chat backend. No retries, no backoff.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        Url::parse(base_url)?;
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        fetch_json(&self.client, url).await
    }
}

pub(crate) fn build_client(timeout: Option<Duration>) -> Result<Client, TransportError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| TransportError::Network(e.to_string()))
}

/// Non-2xx answers become `TransportError::Status` carrying the body text.
async fn check(resp: Response) -> Result<Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();
    error!("Backend answered {} for {}: {}", status, url, body);
    Err(TransportError::Status { status: status.as_u16(), body })
}

pub(crate) async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: &str
) -> Result<T, TransportError> {
    debug!("GET {}", url);
    let resp = check(client.get(url).send().await?).await?;
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn list_conversations(
        &self,
        user_id: &str
    ) -> Result<Vec<ConversationSummary>, TransportError> {
        let query: String = form_urlencoded::Serializer
            ::new(String::new())
            .append_pair("userId", user_id)
            .finish();
        let url = self.endpoint(&format!("/conversations?{}", query));
        self.get_json(&url).await
    }

    async fn load_messages(&self, conversation_id: i64) -> Result<Vec<ChatMessage>, TransportError> {
        let url = self.endpoint(&format!("/conversations/{}/messages", conversation_id));
        let turns: Vec<StoredTurn> = self.get_json(&url).await?;
        Ok(turns.into_iter().map(ChatMessage::from).collect())
    }

    async fn send(&self, request: &SendRequest) -> Result<SendResponse, TransportError> {
        let url = self.endpoint("/send");
        debug!("POST {} (conversation {:?})", url, request.conversacion_id);
        let resp = self.client.post(&url).json(request).send().await?;
        let resp = check(resp).await?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<(), TransportError> {
        let url = self.endpoint(&format!("/conversations/{}", conversation_id));
        debug!("DELETE {}", url);
        let resp = self.client.delete(&url).send().await?;
        check(resp).await?;
        Ok(())
    }
}
