//! Router setup with all API routes and middleware.

use crate::handlers::{self, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Request size limit for JSON bodies.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/hello", get(handlers::hello))
        .route("/test", get(handlers::diagnostics))
        .route("/api/leads", post(handlers::create_lead))
        .route("/api/ask", post(handlers::ask))
}

fn finish(api: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    // Health check stays outside the API layers so probes are never throttled
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Router without rate limiting.
pub fn create_router(state: Arc<AppState>) -> Router {
    finish(api_routes(), state)
}

/// Router with per-IP rate limiting on the API routes.
///
/// Must be served with connect info (`into_make_service_with_connect_info`)
/// so clients without forwarding headers can still be keyed by peer address.
pub fn create_rate_limited_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(state.config.rate_limit_per_second)
            .burst_size(state.config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?,
    );

    let api = api_routes().layer(ServiceBuilder::new().layer(GovernorLayer {
        config: governor_conf,
    }));

    Ok(finish(api, state))
}
