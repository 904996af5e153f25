//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API.
//! The default target is Groq (`https://api.groq.com/openai`), which exposes
//! `/v1/chat/completions` under that base.
//!
//! # Configuration
//!
//! Environment variables (Groq):
//! - `GROQ_API_KEY`: API key (required)
//! - `GROQ_MODEL`: Model name (default: llama3-8b-8192)
//! - `GROQ_API_BASE`: Base URL (default: https://api.groq.com/openai)
//!
//! Environment variables (generic):
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::LlmBackend;

/// Groq's OpenAI-compatible API base
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai";

/// Model used for every chat request unless overridden
pub const DEFAULT_GROQ_MODEL: &str = "llama3-8b-8192";

/// Substituted when the provider returns no content
pub const EMPTY_REPLY_FALLBACK: &str = "Sorry, I didn’t understand.";

/// OpenAI-compatible backend
///
/// # Example
///
/// ```rust,ignore
/// // Groq
/// export GROQ_API_KEY="gsk_..."
///
/// // Self-hosted vLLM
/// export LLM_BACKEND="openai_compatible"
/// export OPENAI_COMPATIBLE_HOST="http://192.168.1.100:8000"
/// export OPENAI_COMPATIBLE_MODEL="meta-llama/Llama-3.2-3B-Instruct"
/// ```
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        let mut backend = Self::new(base_url, model);
        backend.api_key = Some(api_key.to_string());
        backend
    }

    /// Create a Groq backend from environment variables
    ///
    /// Required: `GROQ_API_KEY`
    /// Optional: `GROQ_MODEL`, `GROQ_API_BASE`
    pub fn groq_from_env() -> Option<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let model =
            std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string());
        let base =
            std::env::var("GROQ_API_BASE").unwrap_or_else(|_| DEFAULT_GROQ_BASE_URL.to_string());
        Some(Self::with_api_key(&base, &model, &api_key))
    }

    /// Create from environment variables
    ///
    /// Required: `OPENAI_COMPATIBLE_HOST`
    /// Optional: `OPENAI_COMPATIBLE_MODEL` (default: gpt-3.5-turbo)
    /// Optional: `OPENAI_COMPATIBLE_API_KEY`
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OPENAI_COMPATIBLE_HOST").ok()?;
        let model = std::env::var("OPENAI_COMPATIBLE_MODEL")
            .unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
        let api_key = std::env::var("OPENAI_COMPATIBLE_API_KEY").ok();

        let mut backend = Self::new(&host, &model);
        backend.api_key = api_key;
        Some(backend)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref api_key) => builder.header("Authorization", format!("Bearer {}", api_key)),
            None => builder,
        }
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// Chat completion choice
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

/// Chat response message
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmBackend for OpenAICompatibleBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        };

        let response = self
            .authorize(
                self.http_client
                    .post(format!("{}/v1/chat/completions", self.base_url))
                    .json(&request),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, model = %self.model, "LLM request failed");
            return Err(Error::Upstream(format!("LLM API error {}: {}", status, body)));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty());

        match content {
            Some(text) => {
                debug!(model = %self.model, chars = text.len(), "LLM reply received");
                Ok(text)
            }
            None => {
                warn!(model = %self.model, "LLM returned no content, using fallback reply");
                Ok(EMPTY_REPLY_FALLBACK.to_string())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let request = self.authorize(
            self.http_client
                .get(format!("{}/v1/models", self.base_url))
                .timeout(std::time::Duration::from_secs(5)),
        );
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, host = %self.base_url, "LLM health check failed");
                false
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
