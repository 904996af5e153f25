//! Test utilities for fingenie-core
//!
//! This module provides testing infrastructure including a mock
//! OpenAI-compatible server that stands in for Groq during development and
//! integration tests.

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Prompts containing this text get a 500 from the mock server
pub const FAIL_TRIGGER: &str = "__fail__";

/// Prompts containing this text get a choice with null content
pub const EMPTY_TRIGGER: &str = "__empty__";

/// Mock chat completions server for testing and development
pub struct MockLlmServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockLlmServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat_completions));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockLlmServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

/// Model list endpoint (health check)
async fn handle_models() -> Json<serde_json::Value> {
    Json(json!({
        "object": "list",
        "data": [{ "id": "llama3-8b-8192", "object": "model" }]
    }))
}

/// Chat completions endpoint
async fn handle_chat_completions(Json(request): Json<CompletionRequest>) -> Response {
    let prompt = request
        .messages
        .last()
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    if prompt.contains(FAIL_TRIGGER) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "message": "mock upstream failure" } })),
        )
            .into_response();
    }

    let content = if prompt.contains(EMPTY_TRIGGER) {
        serde_json::Value::Null
    } else {
        json!(format!("[{}] You asked: {}", request.model, prompt))
    };

    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": request.model,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}
