//! HTTP server for logicad

use crate::auth::{SessionResolver, StaticSessions};
use crate::config::Config;
use crate::routes;
use crate::service::TranslationService;
use anyhow::{Context, Result};
use axum::Router;
use logica_shared::{DbLocation, HttpLlmClient, LlmClient, SqliteTranslationStore, TranslationStore};
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    pub service: TranslationService,
    pub sessions: Arc<dyn SessionResolver>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        store: Arc<dyn TranslationStore>,
        sessions: Arc<dyn SessionResolver>,
    ) -> Self {
        Self {
            service: TranslationService::new(llm, store),
            sessions,
            start_time: Instant::now(),
        }
    }
}

/// Assemble all routes with tracing and the body size cap
pub fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::auth_routes())
        .merge(routes::translation_routes())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    let store = SqliteTranslationStore::open(DbLocation::File(config.storage.db_path.clone()))
        .await
        .context("Failed to open translation database")?;

    let llm = HttpLlmClient::new(config.llm.clone()).context("Failed to create LLM client")?;
    info!(
        "  LLM endpoint {} (model {})",
        config.llm.endpoint, config.llm.model
    );

    let sessions = StaticSessions::new(&config.auth.users);
    if sessions.is_empty() {
        warn!("  No users configured in [[auth.users]]; every translation request will get 401");
    } else {
        info!("  {} user session(s) configured", sessions.len());
    }

    let state = Arc::new(AppState::new(
        Arc::new(llm),
        Arc::new(store),
        Arc::new(sessions),
    ));
    let app = build_router(state, config.server.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    info!("  Listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down gracefully");
        })
        .await?;
    Ok(())
}
