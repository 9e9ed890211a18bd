//! Admin read surface over the onboarded-listener secrets.
//!
//! Two read-only endpoints for internal callers, both gated by a shared
//! secret in the `x-api-key` header. A coarse gate for a trusted-network
//! tool, not a general auth boundary.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::config::AppConfig;
use crate::secrets::SecretStore;

/// State for the admin API.
#[derive(Clone)]
pub struct AdminAppState {
    pub config: Arc<AppConfig>,
    pub secret_store: Arc<SecretStore>,
}

/// A single entry in the `GET /admin/users` response.
#[derive(Serialize)]
pub struct UserSummary {
    pub spotify_user_id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

enum AdminError {
    Unauthorized,
    NotFound,
    Store(anyhow::Error),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AdminError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AdminError::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AdminError::Store(e) => {
                error!(error = %e, "Secret store error on admin endpoint");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Secret store error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Create the admin API router.
pub fn create_admin_router(state: AdminAppState) -> Router {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/internal/get-token/:spotify_user_id", get(get_token))
        .with_state(Arc::new(state))
}

/// GET /admin/users — every onboarded listener, projected to id + name.
///
/// Secrets whose latest payload cannot be read or parsed are skipped rather
/// than failing the whole listing.
async fn list_users(
    State(state): State<Arc<AdminAppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserSummary>>, AdminError> {
    require_api_key(&headers, &state.config.admin_api_key)?;

    let names = state
        .secret_store
        .list_by_prefix(&state.config.secret_prefix)
        .await
        .map_err(AdminError::Store)?;

    let mut users = Vec::new();
    for name in names {
        if let Some(payload) = state.secret_store.get_latest(&name).await {
            users.push(UserSummary {
                spotify_user_id: payload
                    .get("spotify_user_id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                display_name: payload
                    .get("display_name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            });
        }
    }

    Ok(Json(users))
}

/// GET /internal/get-token/:spotify_user_id — full stored payload, verbatim.
async fn get_token(
    State(state): State<Arc<AdminAppState>>,
    Path(spotify_user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AdminError> {
    require_api_key(&headers, &state.config.admin_api_key)?;

    let secret_id = format!("{}{}", state.config.secret_prefix, spotify_user_id);
    state
        .secret_store
        .get_latest(&secret_id)
        .await
        .map(Json)
        .ok_or(AdminError::NotFound)
}

/// Exact comparison of the `x-api-key` header against the configured key.
fn require_api_key(headers: &HeaderMap, expected: &str) -> Result<(), AdminError> {
    let Some(value) = headers.get("x-api-key") else {
        return Err(AdminError::Unauthorized);
    };
    let Ok(key) = value.to_str() else {
        return Err(AdminError::Unauthorized);
    };

    if key == expected {
        Ok(())
    } else {
        Err(AdminError::Unauthorized)
    }
}
