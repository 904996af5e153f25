//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use fingenie_core::test_utils::{MockLlmServer, FAIL_TRIGGER};
use fingenie_core::OpenAICompatibleBackend;
use http_body_util::BodyExt;
use tower::ServiceExt;

fn setup_test_app() -> Router {
    setup_app_with(None, ServerConfig::default())
}

fn setup_app_with(llm: Option<LlmClient>, config: ServerConfig) -> Router {
    let resolver = ResponseResolver::embedded().unwrap();
    create_router(resolver, llm, None, config)
}

fn mock_server_client(server: &MockLlmServer) -> LlmClient {
    LlmClient::OpenAICompatible(OpenAICompatibleBackend::with_api_key(
        &server.url(),
        "llama3-8b-8192",
        "test-key",
    ))
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_session(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/api/sessions", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    json["id"].as_str().unwrap().to_string()
}

// ========== Liveness and Pass-through Chat ==========

#[tokio::test]
async fn test_root_liveness() {
    let app = setup_test_app();

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        handlers::LIVENESS_TEXT
    );
}

#[tokio::test]
async fn test_chat_forwards_to_llm() {
    let server = MockLlmServer::start().await;
    let app = setup_app_with(Some(mock_server_client(&server)), ServerConfig::default());

    let response = app
        .oneshot(post_json(
            "/chat",
            serde_json::json!({ "message": "How do I start a SIP?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let reply = json["reply"].as_str().unwrap();
    assert!(reply.contains("How do I start a SIP?"));
    assert!(reply.contains("llama3-8b-8192"));
}

#[tokio::test]
async fn test_chat_with_mock_backend() {
    let app = setup_app_with(Some(LlmClient::mock()), ServerConfig::default());

    let response = app
        .oneshot(post_json("/chat", serde_json::json!({ "message": "hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["reply"], "FinGenie (mock) received: hello");
}

#[tokio::test]
async fn test_chat_upstream_failure_returns_500() {
    let server = MockLlmServer::start().await;
    let app = setup_app_with(Some(mock_server_client(&server)), ServerConfig::default());

    let response = app
        .oneshot(post_json(
            "/chat",
            serde_json::json!({ "message": FAIL_TRIGGER }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_chat_without_llm_returns_500() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json("/chat", serde_json::json!({ "message": "hi" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = get_body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_chat_missing_message_returns_400() {
    let app = setup_app_with(Some(LlmClient::mock()), ServerConfig::default());

    let response = app
        .oneshot(post_json("/chat", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Resolver ==========

#[tokio::test]
async fn test_resolve_term() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/resolve",
            serde_json::json!({ "message": "What is an FD?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["response_text"]
        .as_str()
        .unwrap()
        .starts_with("A Fixed Deposit (FD)"));
    assert!(json["metadata"].is_null());
}

#[tokio::test]
async fn test_resolve_loan_alert() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/resolve",
            serde_json::json!({ "message": "Should I take a loan?" }),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["metadata"]["kind"], "alert");
}

#[tokio::test]
async fn test_resolve_localized_fallback() {
    let app = setup_test_app();

    let english = get_body_json(
        app.clone()
            .oneshot(post_json(
                "/api/resolve",
                serde_json::json!({ "message": "hello there" }),
            ))
            .await
            .unwrap(),
    )
    .await;
    let hindi = get_body_json(
        app.oneshot(post_json(
            "/api/resolve",
            serde_json::json!({ "message": "hello there", "language": "hi" }),
        ))
        .await
        .unwrap(),
    )
    .await;

    assert!(english["response_text"]
        .as_str()
        .unwrap()
        .starts_with("I'm your financial assistant"));
    assert_ne!(english["response_text"], hindi["response_text"]);
}

#[tokio::test]
async fn test_resolve_rejects_empty_and_unknown_language() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_json("/api/resolve", serde_json::json!({ "message": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json(
            "/api/resolve",
            serde_json::json!({ "message": "FD", "language": "klingon" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Catalogs ==========

#[tokio::test]
async fn test_list_terms() {
    let app = setup_test_app();

    let response = app.oneshot(get("/api/terms")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let terms = json.as_array().unwrap();
    assert_eq!(terms[0]["term"], "FD");
    assert!(terms.iter().any(|t| t["term"] == "loan" && t["sensitive"] == true));
}

#[tokio::test]
async fn test_list_schemes_by_group() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(get("/api/schemes?group=farmer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let schemes = json.as_array().unwrap();
    assert!(!schemes.is_empty());
    assert!(schemes.iter().all(|s| s["group"] == "farmer"));

    let response = app.oneshot(get("/api/schemes?group=pirates")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_languages_and_categories() {
    let app = setup_test_app();

    let languages = get_body_json(app.clone().oneshot(get("/api/languages")).await.unwrap()).await;
    assert_eq!(languages.as_array().unwrap().len(), 5);
    assert_eq!(languages[0]["id"], "en");

    let categories =
        get_body_json(app.clone().oneshot(get("/api/expense-categories")).await.unwrap()).await;
    assert_eq!(categories.as_array().unwrap().len(), 7);
    assert!(categories
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c == "Healthcare"));

    let groups = get_body_json(app.oneshot(get("/api/schemes/groups")).await.unwrap()).await;
    assert!(groups
        .as_array()
        .unwrap()
        .iter()
        .any(|g| g["id"] == "sc-st"));
}

// ========== Sessions ==========

#[tokio::test]
async fn test_session_message_flow() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/sessions/{}/messages", id),
            serde_json::json!({ "content": "Tell me about FD" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["user_message"]["sender"], "user");
    assert_eq!(json["reply"]["sender"], "assistant");
    assert!(json["reply"]["content"]
        .as_str()
        .unwrap()
        .contains("Fixed Deposit"));

    let detail = get_body_json(
        app.oneshot(get(&format!("/api/sessions/{}", id)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["title"], "Tell me about FD");
    assert_eq!(detail["is_loading"], false);
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_session_chat_expense_is_recorded() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/sessions/{}/messages", id),
            serde_json::json!({ "content": "I spent 400 on travel" }),
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["reply"]["metadata"]["kind"], "expense");
    assert_eq!(json["reply"]["content"], "Got it! I've logged ₹400 under Travel.");

    let detail = get_body_json(
        app.oneshot(get(&format!("/api/sessions/{}", id)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["expense_total"], 400);
}

#[tokio::test]
async fn test_session_form_expense_reports_month_total() {
    let app = setup_test_app();
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{}/expenses", id);

    let first = get_body_json(
        app.clone()
            .oneshot(post_json(
                &uri,
                serde_json::json!({ "amount": 400, "category": "food" }),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(first["user_message"]["content"], "Spent ₹400 on Food");
    assert!(first["reply"]["content"]
        .as_str()
        .unwrap()
        .ends_with("Your total spending this month is ₹2900."));

    let second = get_body_json(
        app.oneshot(post_json(
            &uri,
            serde_json::json!({ "amount": 100, "category": "Travel" }),
        ))
        .await
        .unwrap(),
    )
    .await;
    assert!(second["reply"]["content"]
        .as_str()
        .unwrap()
        .ends_with("₹3000."));
}

#[tokio::test]
async fn test_session_form_expense_validation() {
    let app = setup_test_app();
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{}/expenses", id);

    let response = app
        .clone()
        .oneshot(post_json(
            &uri,
            serde_json::json!({ "amount": 0, "category": "food" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json(
            &uri,
            serde_json::json!({ "amount": 50, "category": "yachts" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_rejects_empty_message() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/sessions/{}/messages", id),
            serde_json::json!({ "content": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was appended
    let detail = get_body_json(
        app.oneshot(get(&format!("/api/sessions/{}", id)))
            .await
            .unwrap(),
    )
    .await;
    assert!(detail["messages"].as_array().unwrap().is_empty());
    assert_eq!(detail["title"], "New Chat");
}

#[tokio::test]
async fn test_second_submit_while_pending_is_rejected() {
    let config = ServerConfig {
        reply_delay: Duration::from_millis(300),
        ..Default::default()
    };
    let app = setup_app_with(None, config);
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{}/messages", id);

    let pending = tokio::spawn({
        let app = app.clone();
        let uri = uri.clone();
        async move {
            app.oneshot(post_json(&uri, serde_json::json!({ "content": "What is SIP?" })))
                .await
                .unwrap()
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    // Reads are not blocked while the reply is pending
    let detail = get_body_json(
        app.clone()
            .oneshot(get(&format!("/api/sessions/{}", id)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["is_loading"], true);

    let response = app
        .clone()
        .oneshot(post_json(&uri, serde_json::json!({ "content": "What is PPF?" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let first = pending.await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let detail = get_body_json(
        app.oneshot(get(&format!("/api/sessions/{}", id)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["is_loading"], false);
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_abandoned_request_still_completes_turn() {
    let config = ServerConfig {
        reply_delay: Duration::from_millis(300),
        ..Default::default()
    };
    let app = setup_app_with(None, config);
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{}/messages", id);

    // Client gives up long before the reply is ready
    let gave_up = tokio::time::timeout(
        Duration::from_millis(50),
        app.clone()
            .oneshot(post_json(&uri, serde_json::json!({ "content": "What is SIP?" }))),
    )
    .await;
    assert!(gave_up.is_err());

    tokio::time::sleep(Duration::from_millis(600)).await;

    let detail = get_body_json(
        app.clone()
            .oneshot(get(&format!("/api/sessions/{}", id)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["is_loading"], false);
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(post_json(&uri, serde_json::json!({ "content": "What is PPF?" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let detail = get_body_json(
        app.oneshot(get(&format!("/api/sessions/{}", id)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["messages"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_abandoned_expense_request_still_logs_expense() {
    let config = ServerConfig {
        reply_delay: Duration::from_millis(300),
        ..Default::default()
    };
    let app = setup_app_with(None, config);
    let id = create_session(&app).await;

    let gave_up = tokio::time::timeout(
        Duration::from_millis(50),
        app.clone().oneshot(post_json(
            &format!("/api/sessions/{}/expenses", id),
            serde_json::json!({ "amount": 250, "category": "travel" }),
        )),
    )
    .await;
    assert!(gave_up.is_err());

    tokio::time::sleep(Duration::from_millis(600)).await;

    let detail = get_body_json(
        app.oneshot(get(&format!("/api/sessions/{}", id)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["is_loading"], false);
    assert_eq!(detail["expense_total"], 250);
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_llm_mode_failure_leaves_session_usable() {
    let server = MockLlmServer::start().await;
    let config = ServerConfig {
        reply_mode: ReplyMode::Llm,
        ..Default::default()
    };
    let app = setup_app_with(Some(mock_server_client(&server)), config);
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{}/messages", id);

    let response = app
        .clone()
        .oneshot(post_json(&uri, serde_json::json!({ "content": FAIL_TRIGGER })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .clone()
        .oneshot(post_json(&uri, serde_json::json!({ "content": "What is NPS?" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["reply"]["content"]
        .as_str()
        .unwrap()
        .contains("What is NPS?"));

    // Failed turn left only its user message behind
    let detail = get_body_json(
        app.oneshot(get(&format!("/api/sessions/{}", id)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["messages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_session_list_export_and_delete() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    app.clone()
        .oneshot(post_json(
            &format!("/api/sessions/{}/messages", id),
            serde_json::json!({ "content": "Which government scheme suits farmers?" }),
        ))
        .await
        .unwrap();

    let list = get_body_json(app.clone().oneshot(get("/api/sessions")).await.unwrap()).await;
    let entry = list
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == id.as_str())
        .unwrap();
    assert_eq!(entry["message_count"], 2);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/sessions/{}/export", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&id));
    let transcript = get_body_json(response).await;
    assert_eq!(transcript["messages"][1]["metadata"]["kind"], "scheme");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get(&format!("/api/sessions/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_session_returns_404() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/sessions/chat_missing/messages",
            serde_json::json!({ "content": "hi" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_reply_mode_parse() {
    assert_eq!("llm".parse::<ReplyMode>().unwrap(), ReplyMode::Llm);
    assert_eq!("Canned".parse::<ReplyMode>().unwrap(), ReplyMode::Canned);
    assert!("psychic".parse::<ReplyMode>().is_err());
}
