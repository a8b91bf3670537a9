use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OllamaError {
    #[error("Invalid Ollama host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },
    #[error("{0}")]
    ConnectionRefused(String),
    #[error("model \"{0}\" not found, try pulling it first")]
    ModelNotFound(String),
    #[error("{message}")]
    Api {
        status: Option<u16>,
        message: String,
    },
    #[error("{0}")]
    Transport(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for OllamaError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            OllamaError::ConnectionRefused(e.to_string())
        } else if e.is_decode() {
            OllamaError::InvalidResponse(e.to_string())
        } else {
            OllamaError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: String,
    #[serde(default)]
    pub digest: String,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`. Always sent with streaming disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl ChatRequest {
    /// A single-turn request carrying one user message.
    pub fn single(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            stream: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: String,
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Anything that can answer a chat request. `OllamaClient` talks HTTP; tests
/// substitute in-memory backends.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Base URL the backend talks to, used in user-facing messages.
    fn host(&self) -> &str;

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, OllamaError>;
}

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(host: &str) -> Result<Self, OllamaError> {
        Self::with_timeout(host, None)
    }

    /// Like `new`, with an overall per-request timeout. `None` keeps reqwest's
    /// default of no timeout.
    pub fn with_timeout(host: &str, timeout: Option<Duration>) -> Result<Self, OllamaError> {
        let trimmed = host.trim().trim_end_matches('/');
        // OLLAMA_HOST is often given as a bare `host:port`.
        let base_url = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
        let url = Url::parse(&base_url).map_err(|e| OllamaError::InvalidHost {
            host: host.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(OllamaError::InvalidHost {
                host: host.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        // Loopback servers are never reached through a proxy.
        let mut builder = reqwest::Client::builder();
        if is_loopback(&url) {
            builder = builder.no_proxy();
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| OllamaError::InvalidHost {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama is running
    pub async fn is_running(&self) -> bool {
        match self.client.get(&self.base_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// List models pulled on the server
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>, OllamaError> {
        let url = format!("{}/api/tags", self.base_url);
        debug!(%url, "listing models");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let list: ListModelsResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::InvalidResponse(e.to_string()))?;

        Ok(list.models)
    }

    /// Send a non-streaming chat request
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, OllamaError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(%url, model = %request.model, "sending chat request");

        let response = self.client.post(&url).json(&request).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(OllamaError::ModelNotFound(request.model));
        }

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| OllamaError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    fn host(&self) -> &str {
        &self.base_url
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, OllamaError> {
        OllamaClient::chat(self, request).await
    }
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

/// Turn a non-success response into `OllamaError::Api`, preferring the JSON
/// `error` field Ollama sends over the raw body.
async fn api_error(response: reqwest::Response) -> OllamaError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body,
    };

    OllamaError::Api {
        status: Some(status.as_u16()),
        message,
    }
}
