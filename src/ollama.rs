use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{ModelBackend, ModelDescriptor};
use crate::error::BackendError;
use crate::state::ChatMessage;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

#[derive(Deserialize)]
struct OllamaErrorBody {
    error: String,
}

/// HTTP client for a local Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Fails only when the TLS backend cannot be initialised.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        // Without a connect timeout an absent server can hang startup; requests
        // themselves are left unbounded since generation can take minutes.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<OllamaErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Err(BackendError::Status { status, message })
    }
}

#[async_trait]
impl ModelBackend for OllamaClient {
    fn location(&self) -> &str {
        &self.base_url
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, BackendError> {
        let url = format!("{}/api/tags", self.base_url);
        debug!(%url, "listing models");

        let response = Self::check(self.client.get(&url).send().await?).await?;
        let models_response: OllamaModelsResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        Ok(models_response.models)
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = OllamaChatRequest {
            model,
            messages,
            stream: false,
        };
        debug!(%url, model, messages = messages.len(), "sending chat request");

        let response = Self::check(self.client.post(&url).json(&request).send().await?).await?;
        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        chat_response
            .message
            .map(|m| m.content)
            .ok_or_else(|| BackendError::InvalidResponse("missing message".to_string()))
    }
}

/// Accepts the forms `OLLAMA_HOST` is usually given in ("localhost:11434",
/// "http://host:port/") and returns a scheme-qualified URL without a trailing slash.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
