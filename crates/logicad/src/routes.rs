//! API routes for logicad

use crate::auth::AuthenticatedUser;
use crate::server::AppState;
use crate::service::{CpcToNlInput, HistoryQuery, NlToCpcInput};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use logica_shared::{TranslateError, TranslationRecord, TranslationResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type AppStateArc = Arc<AppState>;

/// Error body returned by every failing route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn status_for(e: &TranslateError) -> StatusCode {
    match e {
        TranslateError::Validation(_) => StatusCode::BAD_REQUEST,
        TranslateError::UpstreamEmptyResponse
        | TranslateError::MalformedUpstreamPayload(_)
        | TranslateError::Upstream(_) => StatusCode::BAD_GATEWAY,
        TranslateError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(e: TranslateError) -> ApiError {
    (
        status_for(&e),
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// Undecodable body or query string, reported like any other validation error
fn invalid_request(detail: String) -> ApiError {
    api_error(TranslateError::Validation(format!(
        "Requisição inválida: {}",
        detail
    )))
}

fn json_input<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(input)| input)
        .map_err(|e| invalid_request(e.body_text()))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Auth Routes
// ============================================================================

pub fn auth_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/auth/me", get(me))
}

async fn me(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}

// ============================================================================
// Translation Routes
// ============================================================================

pub fn translation_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/translation/nl-to-cpc", post(nl_to_cpc))
        .route("/v1/translation/cpc-to-nl", post(cpc_to_nl))
        .route("/v1/translation/history", get(history))
}

async fn nl_to_cpc(
    State(state): State<AppStateArc>,
    user: AuthenticatedUser,
    payload: Result<Json<NlToCpcInput>, JsonRejection>,
) -> Result<Json<TranslationResult>, ApiError> {
    let input = json_input(payload)?;
    state
        .service
        .nl_to_cpc(&user, input)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn cpc_to_nl(
    State(state): State<AppStateArc>,
    user: AuthenticatedUser,
    payload: Result<Json<CpcToNlInput>, JsonRejection>,
) -> Result<Json<TranslationResult>, ApiError> {
    let input = json_input(payload)?;
    state
        .service
        .cpc_to_nl(&user, input)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn history(
    State(state): State<AppStateArc>,
    user: AuthenticatedUser,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<TranslationRecord>>, ApiError> {
    let Query(query) = query.map_err(|e| invalid_request(e.body_text()))?;
    state
        .service
        .history(&user, query.limit)
        .await
        .map(Json)
        .map_err(api_error)
}
