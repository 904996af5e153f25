//! FinGenie Web Server
//!
//! Axum-based REST API for the FinGenie Bharat financial assistant.
//!
//! - `GET /` liveness string
//! - `POST /chat` pass-through to the hosted LLM
//! - `/api/*` resolver, catalogs and in-memory chat sessions

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use fingenie_core::{LlmBackend, LlmClient, ResponseResolver};

mod handlers;

pub use handlers::SessionManager;

/// Where session replies come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    /// Rule-based resolver
    #[default]
    Canned,
    /// Hosted LLM
    Llm,
}

impl ReplyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canned => "canned",
            Self::Llm => "llm",
        }
    }
}

impl std::str::FromStr for ReplyMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "canned" | "rules" => Ok(Self::Canned),
            "llm" => Ok(Self::Llm),
            _ => Err(format!("Unknown reply mode: {}", s)),
        }
    }
}

impl std::fmt::Display for ReplyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only, "*" = any)
    pub allowed_origins: Vec<String>,
    /// Source of session replies
    pub reply_mode: ReplyMode,
    /// Artificial latency before a canned session reply
    pub reply_delay: Duration,
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub resolver: ResponseResolver,
    pub llm: Option<LlmClient>,
    pub sessions: SessionManager,
}

/// Create the application router
pub fn create_router(
    resolver: ResponseResolver,
    llm: Option<LlmClient>,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> Router {
    match llm {
        Some(ref client) => info!(
            "LLM backend configured: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => info!("ℹ️  LLM backend not configured (set GROQ_API_KEY to enable /chat)"),
    }
    info!(
        mode = %config.reply_mode,
        delay_ms = config.reply_delay.as_millis() as u64,
        rules = resolver.rule_names().len(),
        "Session replies configured"
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        resolver,
        llm,
        sessions: SessionManager::new(),
    });

    let api_routes = Router::new()
        // Rule-based resolver
        .route("/resolve", post(handlers::resolve_message))
        // Static catalogs
        .route("/terms", get(handlers::list_terms))
        .route("/schemes", get(handlers::list_schemes))
        .route("/schemes/groups", get(handlers::list_scheme_groups))
        .route("/languages", get(handlers::list_languages))
        .route("/expense-categories", get(handlers::list_expense_categories))
        // Chat sessions
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/sessions/:id/export", get(handlers::export_session))
        .route("/sessions/:id/messages", post(handlers::post_session_message))
        .route("/sessions/:id/expenses", post(handlers::post_session_expense));

    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let cors = if config.allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    } else if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    };

    let mut app = Router::new()
        .route("/", get(handlers::root))
        .route("/chat", post(handlers::chat))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    // Serve the front-end build if provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    host: &str,
    port: u16,
    resolver: ResponseResolver,
    llm: Option<LlmClient>,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if let Some(ref client) = llm {
        check_llm_connection(client).await;
    }

    let app = create_router(resolver, llm, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("🚀 Server is running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log LLM backend connection status
async fn check_llm_connection(client: &LlmClient) {
    if client.health_check().await {
        info!(
            "✅ LLM backend reachable: {} (model: {})",
            client.host(),
            client.model()
        );
    } else {
        warn!(
            "⚠️  LLM backend configured but not responding: {} (model: {})",
            client.host(),
            client.model()
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error onto the status its caller should see
    pub fn from_core(err: fingenie_core::Error) -> Self {
        use fingenie_core::Error;

        match err {
            Error::EmptyInput | Error::InvalidData(_) => Self::bad_request(&err.to_string()),
            Error::NotFound(_) => Self::not_found(&err.to_string()),
            Error::ReplyPending => Self::conflict(&err.to_string()),
            // Upstream failures surface their message to the caller
            Error::Upstream(_) | Error::Http(_) => Self::internal(&err.to_string()),
            other => Self::from(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
