use crate::config::Config;
use crate::errors::AppError;
use crate::knowledge_base::KnowledgeBase;
use crate::models::*;
use crate::services::{ChatService, LeadService};
use crate::store::DocumentStore;
use crate::validation::ValidatedJson;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

/// Longest error excerpt shown by the diagnostics endpoint.
const DIAGNOSTIC_ERROR_CHARS: usize = 50;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Persistence gateway.
    pub store: Arc<dyn DocumentStore>,
    pub chat: ChatService,
    pub leads: LeadService,
}

impl AppState {
    pub fn new(
        config: Config,
        knowledge_base: Arc<KnowledgeBase>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            chat: ChatService::new(knowledge_base, store.clone()),
            leads: LeadService::new(store.clone()),
            config,
            store,
        }
    }
}

/// Health check endpoint.
///
/// Returns the service status and version.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "aurum-vision-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Aurum Vision Backend Running".to_string(),
    })
}

/// GET /api/hello
pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from the Aurum Vision API".to_string(),
    })
}

fn excerpt(err: &AppError) -> String {
    err.detail().chars().take(DIAGNOSTIC_ERROR_CHARS).collect()
}

fn presence(set: bool) -> Option<String> {
    Some(if set { "✅ Set" } else { "❌ Not Set" }.to_string())
}

/// GET /test
///
/// Reports backend status and best-effort database connectivity. Never
/// fails: every storage error is rendered into the `database` field.
pub async fn diagnostics(State(state): State<Arc<AppState>>) -> Json<DiagnosticsResponse> {
    let mut response = DiagnosticsResponse {
        backend: "✅ Running".to_string(),
        database: "❌ Not Available".to_string(),
        database_url: None,
        database_name: None,
        connection_status: "Not Connected".to_string(),
        collections: Vec::new(),
    };

    if state.store.is_configured() {
        match state.store.database_name().await {
            Ok(name) => {
                tracing::debug!("Diagnostics reached database '{}'", name);
                response.database = "✅ Available".to_string();
                response.connection_status = "Connected".to_string();

                match state.store.list_collections().await {
                    Ok(collections) => {
                        response.collections = collections;
                        response.database = "✅ Connected & Working".to_string();
                    }
                    Err(e) => {
                        response.database = format!("⚠️  Connected but Error: {}", excerpt(&e));
                    }
                }
            }
            Err(e) => {
                response.database = format!("❌ Error: {}", excerpt(&e));
            }
        }
    } else {
        response.database = "⚠️  Available but not initialized".to_string();
    }

    response.database_url = presence(state.config.database_url.is_some());
    response.database_name = presence(state.config.database_name.is_some());

    Json(response)
}

/// POST /api/leads
///
/// Stores a validated lead. Storage failures surface as HTTP 500 with the
/// gateway message as `detail`.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    ValidatedJson(lead): ValidatedJson<Lead>,
) -> Result<Json<LeadCreatedResponse>, AppError> {
    tracing::info!("POST /api/leads - source: {}", lead.source);

    let id = state.leads.submit(lead).await?;

    Ok(Json(LeadCreatedResponse {
        status: "success".to_string(),
        id,
    }))
}

/// POST /api/ask
///
/// Answers from the FAQ table. Chat logging happens in the background and
/// cannot fail the request.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    tracing::debug!(
        "POST /api/ask - session: {:?}, {} chars",
        request.session_id,
        request.question.chars().count()
    );

    let (answer, _logging) = state.chat.ask(&request.question, request.session_id);

    Ok(Json(AskResponse {
        answer,
        sources: None,
    }))
}
