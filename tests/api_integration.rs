//! Integration tests for the HTTP surface.
//!
//! Every test builds its own router over an in-memory (or deliberately
//! broken) store and drives it with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use aurum_vision_api::config::Config;
use aurum_vision_api::create_router;
use aurum_vision_api::handlers::AppState;
use aurum_vision_api::knowledge_base::{KnowledgeBase, DEFAULT_ANSWER};
use aurum_vision_api::models::{AskResponse, ChatRole, DiagnosticsResponse, LeadCreatedResponse};
use aurum_vision_api::routes::MAX_BODY_BYTES;
use aurum_vision_api::store::{
    Collection, Document, DocumentStore, MemoryStore, UnavailableStore,
};

// =============================================================================
// Helpers
// =============================================================================

fn make_app(store: Arc<dyn DocumentStore>) -> axum::Router {
    make_app_with_config(Config::default(), store)
}

fn make_app_with_config(config: Config, store: Arc<dyn DocumentStore>) -> axum::Router {
    let state = AppState::new(config, Arc::new(KnowledgeBase::builtin()), store);
    create_router(Arc::new(state))
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Waits for the background chat logger to write `expected` documents.
async fn wait_for_chat_logs(store: &MemoryStore, expected: usize) {
    for _ in 0..100 {
        if store.documents(Collection::ChatLog).await.len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("chat logs were not written");
}

fn valid_lead() -> Value {
    json!({
        "name": "Carla Mendes",
        "email": "carla@example.com",
        "phone": "+55 11 91234-5678",
        "monthly_budget": 300.0,
        "message": "Interested in a monthly plan"
    })
}

// =============================================================================
// Static endpoints
// =============================================================================

#[tokio::test]
async fn test_root_liveness_message() {
    let app = make_app(Arc::new(MemoryStore::new()));
    let resp = app.oneshot(get("/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["message"], "Aurum Vision Backend Running");
}

#[tokio::test]
async fn test_hello() {
    let app = make_app(Arc::new(MemoryStore::new()));
    let resp = app.oneshot(get("/api/hello")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["message"],
        "Hello from the Aurum Vision API"
    );
}

#[tokio::test]
async fn test_health() {
    let app = make_app(Arc::new(UnavailableStore::default()));
    let resp = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "healthy");
}

// =============================================================================
// Diagnostics
// =============================================================================

#[tokio::test]
async fn test_diagnostics_without_database() {
    let app = make_app(Arc::new(UnavailableStore::default()));
    let resp = app.oneshot(get("/test")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let diag: DiagnosticsResponse = serde_json::from_value(body_json(resp).await).unwrap();
    assert_eq!(diag.backend, "✅ Running");
    assert_eq!(diag.database, "⚠️  Available but not initialized");
    assert_eq!(diag.connection_status, "Not Connected");
    assert_eq!(diag.database_url.as_deref(), Some("❌ Not Set"));
    assert_eq!(diag.database_name.as_deref(), Some("❌ Not Set"));
    assert!(diag.collections.is_empty());
}

#[tokio::test]
async fn test_diagnostics_connected() {
    let store = Arc::new(MemoryStore::new());
    store
        .create_document(
            "lead",
            &Document::Lead(serde_json::from_value(valid_lead()).unwrap()),
        )
        .await
        .unwrap();

    let config = Config {
        database_url: Some("postgres://localhost/aurum".to_string()),
        ..Config::default()
    };
    let app = make_app_with_config(config, store);
    let resp = app.oneshot(get("/test")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let diag: DiagnosticsResponse = serde_json::from_value(body_json(resp).await).unwrap();
    assert_eq!(diag.database, "✅ Connected & Working");
    assert_eq!(diag.connection_status, "Connected");
    assert_eq!(diag.collections, vec!["lead".to_string()]);
    assert_eq!(diag.database_url.as_deref(), Some("✅ Set"));
    assert_eq!(diag.database_name.as_deref(), Some("❌ Not Set"));
}

#[tokio::test]
async fn test_diagnostics_reports_outage_as_status() {
    let store = Arc::new(MemoryStore::new());
    store.set_available(false);
    let app = make_app(store);
    let resp = app.oneshot(get("/test")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let diag: DiagnosticsResponse = serde_json::from_value(body_json(resp).await).unwrap();
    assert_eq!(diag.database, "❌ Error: Database not available");
    assert_eq!(diag.connection_status, "Not Connected");
}

// =============================================================================
// Leads
// =============================================================================

#[tokio::test]
async fn test_create_lead_success() {
    let store = Arc::new(MemoryStore::new());
    let app = make_app(store.clone());

    let resp = app
        .oneshot(post_json("/api/leads", valid_lead()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let created: LeadCreatedResponse = serde_json::from_value(body_json(resp).await).unwrap();
    assert_eq!(created.status, "success");

    let leads = store.documents(Collection::Lead).await;
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].meta.id.to_string(), created.id);
    match &leads[0].document {
        Document::Lead(lead) => {
            assert_eq!(lead.email, "carla@example.com");
            assert_eq!(lead.source, "website");
        }
        other => panic!("unexpected document: {:?}", other),
    }
}

#[tokio::test]
async fn test_create_lead_rejects_invalid_email_before_storage() {
    let store = Arc::new(MemoryStore::new());
    let app = make_app(store.clone());

    let mut lead = valid_lead();
    lead["email"] = json!("not-an-email");
    let resp = app.oneshot(post_json("/api/leads", lead)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("email"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_create_lead_rejects_missing_fields_and_bad_json() {
    let store = Arc::new(MemoryStore::new());

    let resp = make_app(store.clone())
        .oneshot(post_json("/api/leads", json!({"name": "Carla"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = make_app(store.clone())
        .oneshot(
            Request::post("/api/leads")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_create_lead_without_json_content_type_is_415() {
    let store = Arc::new(MemoryStore::new());

    let resp = make_app(store.clone())
        .oneshot(
            Request::post("/api/leads")
                .body(Body::from(valid_lead().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body_json(resp).await["detail"].is_string());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_create_lead_oversized_body_is_413() {
    let store = Arc::new(MemoryStore::new());

    let mut lead = valid_lead();
    lead["message"] = json!("x".repeat(MAX_BODY_BYTES + 1));
    let resp = make_app(store.clone())
        .oneshot(post_json("/api/leads", lead))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_create_lead_storage_outage_returns_500() {
    let app = make_app(Arc::new(UnavailableStore::new("Database not available")));

    let resp = app
        .oneshot(post_json("/api/leads", valid_lead()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["detail"], "Database not available");
}

// =============================================================================
// Ask
// =============================================================================

#[tokio::test]
async fn test_ask_returns_matching_answer_and_logs_exchange() {
    let store = Arc::new(MemoryStore::new());
    let app = make_app(store.clone());

    let resp = app
        .oneshot(post_json(
            "/api/ask",
            json!({"question": "Can I get it insured in a vault?", "session_id": "abc"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["sources"].is_null());
    let answer: AskResponse = serde_json::from_value(body).unwrap();
    assert!(answer.answer.contains("insured partner vaults"));

    wait_for_chat_logs(&store, 2).await;
    let logs = store.documents(Collection::ChatLog).await;
    let roles: Vec<ChatRole> = logs
        .iter()
        .map(|d| match &d.document {
            Document::ChatLog(entry) => entry.role,
            other => panic!("unexpected document: {:?}", other),
        })
        .collect();
    assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
}

#[tokio::test]
async fn test_ask_default_answer() {
    let app = make_app(Arc::new(MemoryStore::new()));

    let resp = app
        .oneshot(post_json(
            "/api/ask",
            json!({"question": "What is the meaning of life?"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["answer"], DEFAULT_ANSWER);
}

#[tokio::test]
async fn test_ask_succeeds_during_storage_outage() {
    let store = Arc::new(MemoryStore::new());
    store.set_available(false);
    let app = make_app(store.clone());

    let resp = app
        .oneshot(post_json(
            "/api/ask",
            json!({"question": "I want to know about PURITY and 999 gold"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["answer"]
        .as_str()
        .unwrap()
        .contains("LBMA-certified"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_ask_without_database_still_answers() {
    let app = make_app(Arc::new(UnavailableStore::default()));

    let resp = app
        .oneshot(post_json("/api/ask", json!({"question": "any hidden fees?"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["answer"]
        .as_str()
        .unwrap()
        .starts_with("Pricing is transparent"));
}

#[tokio::test]
async fn test_ask_rejects_short_question() {
    let store = Arc::new(MemoryStore::new());
    let app = make_app(store.clone());

    let resp = app
        .oneshot(post_json("/api/ask", json!({"question": "?"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(store.is_empty().await);
}
