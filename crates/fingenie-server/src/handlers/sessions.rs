//! Chat session handlers
//!
//! Sessions live in memory only. Each session allows one pending reply at a
//! time; the session lock is not held while the reply is generated, so other
//! sessions (and reads of this one) stay responsive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::chat::parse_language;
use crate::{AppError, AppState, ReplyMode};
use fingenie_core::{
    ChatSession, Error, ExpenseCategory, ExpenseRecord, Language, LlmBackend, Message,
    ResolvedResponse, Result as CoreResult,
};

/// Session timeout (30 minutes of inactivity)
const SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    session: ChatSession,
    last_activity: Instant,
}

impl SessionEntry {
    fn is_expired(&self) -> bool {
        self.last_activity.elapsed() > SESSION_TIMEOUT
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

/// In-memory session store
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    counter: AtomicU64,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session and return its summary
    pub async fn create_session(&self) -> SessionSummary {
        // Timestamp + counter keeps IDs unique within the same nanosecond
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut hasher = Sha256::new();
        hasher.update(timestamp.to_le_bytes());
        hasher.update(seq.to_le_bytes());
        let digest = hex::encode(hasher.finalize());
        let session_id = format!("chat_{}", &digest[..16]);

        let session = ChatSession::new(session_id.clone());
        let summary = SessionSummary::from(&session);

        let mut sessions = self.sessions.write().await;

        // Clean up expired sessions while we're here
        sessions.retain(|_, s| !s.is_expired());

        sessions.insert(
            session_id,
            SessionEntry {
                session,
                last_activity: Instant::now(),
            },
        );
        summary
    }

    /// Summaries of live sessions, newest first
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .filter(|s| !s.is_expired())
            .map(|s| SessionSummary::from(&s.session))
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        summaries
    }

    /// Read a session without touching it
    pub async fn read<T>(&self, id: &str, f: impl FnOnce(&ChatSession) -> T) -> CoreResult<T> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .filter(|s| !s.is_expired())
            .map(|s| f(&s.session))
            .ok_or_else(|| Error::NotFound(format!("session {}", id)))
    }

    /// Run a mutation against a live session under the write lock.
    ///
    /// Only a successful mutation counts as activity.
    pub async fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut ChatSession) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .filter(|s| !s.is_expired())
            .ok_or_else(|| Error::NotFound(format!("session {}", id)))?;
        let out = f(&mut entry.session)?;
        entry.touch();
        Ok(out)
    }

    /// Clear the pending flag after a failed reply
    pub async fn abandon_turn(&self, id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(id) {
            entry.session.abandon_turn();
        }
    }

    pub async fn delete(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id).is_some()
    }
}

/// Session list entry (sidebar)
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
    pub is_loading: bool,
}

impl From<&ChatSession> for SessionSummary {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id().to_string(),
            title: session.title().to_string(),
            created_at: session.created_at(),
            message_count: session.messages().len(),
            is_loading: session.is_loading(),
        }
    }
}

/// Full session view
#[derive(Debug, Serialize)]
pub struct SessionDetail {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub is_loading: bool,
    pub expense_total: u64,
    pub messages: Vec<Message>,
}

impl From<&ChatSession> for SessionDetail {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id().to_string(),
            title: session.title().to_string(),
            created_at: session.created_at(),
            is_loading: session.is_loading(),
            expense_total: session.expense_total(),
            messages: session.messages().to_vec(),
        }
    }
}

/// A completed exchange: the user message and the assistant reply
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub user_message: Message,
    pub reply: Message,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogExpenseRequest {
    pub amount: u64,
    pub category: String,
}

/// Create a new chat session
pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = state.sessions.create_session().await;
    info!(session = %summary.id, "Chat session created");
    (StatusCode::CREATED, Json(summary))
}

/// List chat sessions
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionSummary>> {
    Json(state.sessions.list().await)
}

/// Get a chat session with its messages
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetail>, AppError> {
    let detail = state
        .sessions
        .read(&id, |s| SessionDetail::from(s))
        .await
        .map_err(AppError::from_core)?;
    Ok(Json(detail))
}

/// Delete a chat session
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.delete(&id).await {
        info!(session = %id, "Chat session deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Session not found"))
    }
}

/// Download a session transcript as JSON
pub async fn export_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let transcript = state
        .sessions
        .read(&id, ChatSession::transcript)
        .await
        .map_err(AppError::from_core)?;

    let disposition = format!("attachment; filename=\"fingenie-{}.json\"", id);
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(transcript)))
}

/// Send a chat message and wait for the assistant reply
pub async fn post_session_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let language = parse_language(req.language.as_deref())?;

    let user_message = state
        .sessions
        .with_session(&id, |s| s.begin_user_turn(&req.content))
        .await
        .map_err(AppError::from_core)?;

    // The turn finishes on its own task so a dropped request cannot leave it pending
    let task = tokio::spawn(finish_user_turn(
        Arc::clone(&state),
        id.clone(),
        req.content,
        language,
    ));
    let reply = task.await?.map_err(AppError::from_core)?;

    debug!(
        session = %id,
        kind = reply.metadata.as_ref().map(|m| m.kind()).unwrap_or("text"),
        "Reply appended"
    );

    Ok(Json(TurnResponse {
        user_message,
        reply,
    }))
}

/// Log an expense through the expense form
pub async fn post_session_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<LogExpenseRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let category: ExpenseCategory = req
        .category
        .parse()
        .map_err(|e: String| AppError::bad_request(&e))?;

    let (user_message, record) = state
        .sessions
        .with_session(&id, |s| s.begin_expense_turn(req.amount, category))
        .await
        .map_err(AppError::from_core)?;

    let task = tokio::spawn(finish_expense_turn(
        Arc::clone(&state),
        id.clone(),
        record.clone(),
    ));
    let reply = task.await?.map_err(AppError::from_core)?;

    info!(
        session = %id,
        amount = record.amount,
        category = %record.category,
        "Expense logged"
    );

    Ok(Json(TurnResponse {
        user_message,
        reply,
    }))
}

async fn finish_user_turn(
    state: Arc<AppState>,
    id: String,
    content: String,
    language: Language,
) -> CoreResult<Message> {
    let resolved = match generate_reply(&state, &content, language).await {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(session = %id, error = %e, "Reply generation failed");
            state.sessions.abandon_turn(&id).await;
            return Err(e);
        }
    };

    state
        .sessions
        .with_session(&id, |s| s.complete_turn(resolved))
        .await
}

async fn finish_expense_turn(
    state: Arc<AppState>,
    id: String,
    record: ExpenseRecord,
) -> CoreResult<Message> {
    reply_delay(&state).await;

    let resolver = &state.resolver;
    state
        .sessions
        .with_session(&id, |s| {
            let month_total = resolver.monthly_baseline() + s.expense_total() + record.amount;
            s.complete_turn(resolver.confirm_expense(&record, month_total))
        })
        .await
}

/// Produce the assistant reply according to the configured mode
async fn generate_reply(
    state: &AppState,
    content: &str,
    language: Language,
) -> CoreResult<ResolvedResponse> {
    match state.config.reply_mode {
        ReplyMode::Canned => {
            reply_delay(state).await;
            Ok(state.resolver.resolve_localized(content, language))
        }
        ReplyMode::Llm => {
            let llm = state
                .llm
                .as_ref()
                .ok_or_else(|| Error::Upstream("LLM backend not configured".into()))?;
            let text = llm.complete(content).await?;
            Ok(ResolvedResponse::text(text))
        }
    }
}

async fn reply_delay(state: &AppState) {
    if !state.config.reply_delay.is_zero() {
        tokio::time::sleep(state.config.reply_delay).await;
    }
}
