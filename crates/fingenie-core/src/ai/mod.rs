//! Pluggable hosted LLM backend abstraction
//!
//! # Architecture
//!
//! - `LlmBackend` trait: defines the interface for all LLM backends
//! - `LlmClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend` (Groq by default), `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let llm = LlmClient::from_env();
//!
//! if let Some(ref client) = llm {
//!     let reply = client.complete("What is SIP?").await?;
//!     println!("{}", reply);
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `LLM_BACKEND`: Backend to use (groq, openai_compatible, mock). Default: groq
//! - `GROQ_API_KEY`: Groq API key (required for groq backend)
//! - `GROQ_MODEL`: Model name (default: llama3-8b-8192)
//! - `GROQ_API_BASE`: API base URL (default: https://api.groq.com/openai)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod openai_compatible;

pub use mock::MockBackend;
pub use openai_compatible::{
    OpenAICompatibleBackend, DEFAULT_GROQ_BASE_URL, DEFAULT_GROQ_MODEL, EMPTY_REPLY_FALLBACK,
};

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all LLM backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send a single user-role message and return the generated text
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete LLM client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum LlmClient {
    /// Groq or any other OpenAI-compatible chat completions API
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl LlmClient {
    /// Create an LLM client from environment variables
    ///
    /// Checks `LLM_BACKEND` to determine which backend to use:
    /// - `groq` (default): Uses GROQ_API_KEY, GROQ_MODEL, GROQ_API_BASE
    /// - `openai_compatible`: Uses OPENAI_COMPATIBLE_HOST and OPENAI_COMPATIBLE_MODEL
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("LLM_BACKEND").unwrap_or_else(|_| "groq".to_string());

        match backend.to_lowercase().as_str() {
            "groq" => OpenAICompatibleBackend::groq_from_env().map(LlmClient::OpenAICompatible),
            "openai_compatible" | "openai" => {
                OpenAICompatibleBackend::from_env().map(LlmClient::OpenAICompatible)
            }
            "mock" => Some(LlmClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown LLM_BACKEND, falling back to groq");
                OpenAICompatibleBackend::groq_from_env().map(LlmClient::OpenAICompatible)
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        LlmClient::Mock(MockBackend::new())
    }
}

// Implement LlmBackend for LlmClient by delegating to the inner backend
#[async_trait]
impl LlmBackend for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            LlmClient::OpenAICompatible(b) => b.complete(prompt).await,
            LlmClient::Mock(b) => b.complete(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            LlmClient::OpenAICompatible(b) => b.health_check().await,
            LlmClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            LlmClient::OpenAICompatible(b) => b.model(),
            LlmClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            LlmClient::OpenAICompatible(b) => b.host(),
            LlmClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_client_mock() {
        let client = LlmClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = LlmClient::mock();
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_complete() {
        let client = LlmClient::mock();
        let reply = client.complete("What is SIP?").await.unwrap();
        assert!(reply.contains("What is SIP?"));
    }
}
