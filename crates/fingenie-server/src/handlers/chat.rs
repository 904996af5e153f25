//! Stateless chat endpoints
//!
//! `POST /chat` forwards a single message to the hosted LLM and returns its
//! reply verbatim. `POST /api/resolve` runs the rule-based resolver instead.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{AppError, AppState};
use fingenie_core::{Language, LlmBackend, ResolvedResponse};

/// Liveness text for `GET /`
pub const LIVENESS_TEXT: &str = "🧞‍♂️ FinGenie backend is running!";

pub async fn root() -> &'static str {
    LIVENESS_TEXT
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Forward one message to the LLM
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let message = req
        .message
        .ok_or_else(|| AppError::bad_request("message is required"))?;

    let llm = state
        .llm
        .as_ref()
        .ok_or_else(|| AppError::internal("LLM backend not configured"))?;

    match llm.complete(&message).await {
        Ok(reply) => {
            debug!(model = llm.model(), chars = reply.len(), "Chat reply sent");
            Ok(Json(ChatReply { reply }))
        }
        Err(e) => {
            error!(error = %e, model = llm.model(), "Chat completion failed");
            Err(AppError::internal(&e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub message: String,
    /// Language code or label ("hi", "Hindi")
    #[serde(default)]
    pub language: Option<String>,
}

/// Run the rule-based resolver on one message
pub async fn resolve_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolvedResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }
    let language = parse_language(req.language.as_deref())?;
    Ok(Json(state.resolver.resolve_localized(&req.message, language)))
}

pub(crate) fn parse_language(raw: Option<&str>) -> Result<Language, AppError> {
    match raw {
        Some(value) => value
            .parse::<Language>()
            .map_err(|e| AppError::bad_request(&e)),
        None => Ok(Language::default()),
    }
}
