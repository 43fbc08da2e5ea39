use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
}

/// Failure kinds for one request/response exchange. All of them collapse
/// into the same user-visible reply; the variant detail only reaches the log.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request to chat backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat backend returned status {0}")]
    Http(StatusCode),

    #[error("chat backend returned a malformed body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("chat request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one user message and return the agent's reply text.
    ///
    /// The body is decoded from text rather than via `Response::json` so a
    /// malformed body surfaces as `Malformed`, not as a transport error.
    pub async fn send(&self, message: &str) -> Result<String, ChatError> {
        let url = format!("{}/api/chat", self.base_url);

        let request = ChatRequest {
            message: message.to_string(),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Http(status));
        }

        let body = response.text().await?;
        let reply: ChatResponse = serde_json::from_str(&body)?;
        Ok(reply.response)
    }

    /// Probe the backend's health endpoint. Advisory only.
    pub async fn health(&self) -> Result<bool, ChatError> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Http(status));
        }

        let body = response.text().await?;
        let health: HealthResponse = serde_json::from_str(&body)?;
        Ok(health.status == "healthy")
    }
}
