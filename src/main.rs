use std::net::SocketAddr;
use std::sync::Arc;

use aurum_vision_api::config::Config;
use aurum_vision_api::db::open_store;
use aurum_vision_api::handlers::AppState;
use aurum_vision_api::knowledge_base::KnowledgeBase;
use aurum_vision_api::create_rate_limited_router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, builds the FAQ knowledge base,
/// opens the persistence gateway and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aurum_vision_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Knowledge base is immutable from here on
    let knowledge_base = match config.faq_kb_path {
        Some(ref path) => KnowledgeBase::from_file(path)?,
        None => KnowledgeBase::builtin(),
    };
    tracing::info!(
        "FAQ knowledge base ready ({} topics)",
        knowledge_base.entries().len()
    );

    let store = open_store(&config).await?;

    let port = config.port;
    let app_state = Arc::new(AppState::new(config, Arc::new(knowledge_base), store));
    let app = create_rate_limited_router(app_state)?;

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
