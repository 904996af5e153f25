//! Mock backend for testing
//!
//! Useful for unit tests and development without a Groq API key.

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::LlmBackend;

/// Mock LLM backend for testing
///
/// Echoes the prompt back. Can be configured to fail.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Whether complete should return an upstream error
    pub failing: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing: false,
        }
    }

    /// Create a mock backend whose completions always fail
    pub fn failing() -> Self {
        Self {
            healthy: false,
            failing: true,
        }
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if self.failing {
            return Err(Error::Upstream("mock backend configured to fail".into()));
        }
        Ok(format!("FinGenie (mock) received: {}", prompt))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
