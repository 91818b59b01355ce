//! Session resolution for API callers.
//!
//! Callers authenticate with `Authorization: Bearer <token>`. The token is
//! resolved to an [`AuthenticatedUser`] which handlers pass explicitly into
//! every translation operation.

use crate::config::UserEntry;
use crate::server::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The caller on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub name: String,
}

/// Maps an opaque session token to a user
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Option<AuthenticatedUser>;
}

/// Fixed token table, built from `[[auth.users]]`
#[derive(Debug, Default, Clone)]
pub struct StaticSessions {
    users: HashMap<String, AuthenticatedUser>,
}

impl StaticSessions {
    pub fn new(entries: &[UserEntry]) -> Self {
        let mut users = HashMap::new();
        for entry in entries {
            if entry.token.trim().is_empty() {
                warn!("Ignoring user {} with empty token", entry.id);
                continue;
            }
            users.insert(
                entry.token.clone(),
                AuthenticatedUser {
                    id: entry.id,
                    name: entry.name.clone(),
                },
            );
        }
        Self { users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl SessionResolver for StaticSessions {
    fn resolve(&self, token: &str) -> Option<AuthenticatedUser> {
        self.users.get(token).cloned()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Autenticação necessária")]
    MissingCredentials,

    #[error("Sessão inválida")]
    InvalidSession,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Extract auth token from the Authorization header.
///
/// Supports "Bearer <token>" and, for scripts, a bare token.
pub fn extract_auth_token(parts: &Parts) -> Option<String> {
    let auth_str = parts.headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Mask token for logging (show first 8 chars only)
fn mask_token(token: &str) -> String {
    if token.chars().count() > 8 {
        format!("{}...", token.chars().take(8).collect::<String>())
    } else {
        "***".to_string()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_auth_token(parts).ok_or(AuthError::MissingCredentials)?;
        match state.sessions.resolve(&token) {
            Some(user) => {
                debug!("Authenticated user {} ({})", user.id, mask_token(&token));
                Ok(user)
            }
            None => {
                warn!("Rejected unknown session token {}", mask_token(&token));
                Err(AuthError::InvalidSession)
            }
        }
    }
}
