//! Spotify OAuth 2.0 authorization-code flow.
//!
//! 1. Listener opens /connect (or /auth/login) and is sent to Spotify's
//!    authorization dialog
//! 2. Spotify redirects back to /auth/callback with an authorization code
//! 3. The code is exchanged for tokens, the listener's profile is fetched,
//!    and the refresh token is persisted as a new secret version
//! 4. The access token is discarded once the profile fetch is done
//!
//! Every step is strictly sequential and terminal on failure, with no
//! retries; the listener re-initiates from /connect. Each failure class renders its
//! own generic message while the detail stays in the server log.

mod exchange;
mod profile;
pub mod provider;

pub use provider::SpotifyEndpoints;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::pages;
use crate::config::AppConfig;
use crate::secrets::{CredentialRecord, SecretStore};

/// Shared state for the OAuth flow handlers.
#[derive(Clone)]
pub struct OAuthAppState {
    pub config: Arc<AppConfig>,
    pub endpoints: SpotifyEndpoints,
    pub http_client: reqwest::Client,
    pub secret_store: Arc<SecretStore>,
}

/// OAuth callback query parameters
#[derive(Deserialize)]
pub struct OAuthCallback {
    code: Option<String>,
    state: Option<String>,
}

/// One terminal outcome per failure class. Each renders a distinct generic
/// message so support reports can be told apart without exposing upstream
/// detail to the browser.
enum CallbackError {
    MissingCode,
    Exchange(anyhow::Error),
    MissingTokens,
    ProfileFetch(anyhow::Error),
    MissingIdentity,
    Storage(anyhow::Error),
}

impl CallbackError {
    fn user_message(&self) -> &'static str {
        match self {
            CallbackError::MissingCode => "Missing code parameter.",
            CallbackError::Exchange(_) => "Spotify token exchange failed.",
            CallbackError::MissingTokens => "Spotify did not return the expected tokens.",
            CallbackError::ProfileFetch(_) => "Failed to fetch Spotify profile.",
            CallbackError::MissingIdentity => "Spotify profile is missing a user id.",
            CallbackError::Storage(_) => "Failed to store credentials.",
        }
    }
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        // Full detail is logged here, server-side only; the browser gets the
        // generic per-outcome message.
        match &self {
            CallbackError::MissingCode => {}
            CallbackError::Exchange(e) => error!(error = %e, "Token exchange failed"),
            CallbackError::MissingTokens => {
                warn!("Token response missing access or refresh token")
            }
            CallbackError::ProfileFetch(e) => error!(error = %e, "Profile fetch failed"),
            CallbackError::MissingIdentity => warn!("Spotify profile missing user id"),
            CallbackError::Storage(e) => error!(error = %e, "Failed to store credentials"),
        }

        let status = match self {
            CallbackError::MissingCode => StatusCode::BAD_REQUEST,
            _ => StatusCode::OK,
        };

        (status, Html(pages::error_page(self.user_message()))).into_response()
    }
}

/// Create the OAuth flow router (public browser surface).
pub fn create_oauth_router(state: OAuthAppState) -> Router {
    Router::new()
        .route("/", get(root_redirect))
        .route("/connect", get(connect))
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .with_state(Arc::new(state))
}

/// GET / — send the browser to the connect page.
async fn root_redirect() -> Redirect {
    Redirect::temporary("/connect")
}

/// GET /connect — render the page carrying a fresh authorization URL.
async fn connect(State(state): State<Arc<OAuthAppState>>) -> Html<String> {
    let login_url = state.endpoints.build_auth_url(&state.config, None);
    Html(pages::connect_page(&login_url, &state.config.app_url))
}

/// GET /auth/login — skip the page and redirect straight to Spotify.
async fn login(State(state): State<Arc<OAuthAppState>>) -> Redirect {
    let login_url = state.endpoints.build_auth_url(&state.config, None);
    Redirect::temporary(&login_url)
}

/// GET /auth/callback — the core of the service.
///
/// Exchanges the authorization code, resolves the listener's identity, and
/// appends the refresh credential to the listener's secret. Three external
/// calls, strictly ordered, each depending on the previous one's result.
async fn callback(
    State(state): State<Arc<OAuthAppState>>,
    headers: HeaderMap,
    Query(params): Query<OAuthCallback>,
) -> Result<Html<String>, CallbackError> {
    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(CallbackError::MissingCode)?;

    // The echoed state is logged for correlating attempts; it is not
    // validated against anything (see DESIGN.md). The code and tokens are
    // never logged.
    info!(
        state = params.state.as_deref().unwrap_or("-"),
        user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-"),
        "OAuth callback received"
    );

    let grant = exchange::exchange_code(
        &state.http_client,
        &state.endpoints.token_url,
        code,
        &state.config.spotify_redirect_uri,
        &state.config.spotify_client_id,
        &state.config.spotify_client_secret,
    )
    .await
    .map_err(CallbackError::Exchange)?;

    let (access_token, refresh_token) = match (grant.access_token, grant.refresh_token) {
        (Some(a), Some(r)) if !a.is_empty() && !r.is_empty() => (a, r),
        _ => return Err(CallbackError::MissingTokens),
    };

    let profile = profile::fetch_profile(
        &state.http_client,
        &state.endpoints.profile_url,
        &access_token,
    )
    .await
    .map_err(CallbackError::ProfileFetch)?;

    let spotify_user_id = profile
        .id
        .filter(|id| !id.is_empty())
        .ok_or(CallbackError::MissingIdentity)?;
    let display_name = profile.display_name.unwrap_or_default();

    let record = CredentialRecord {
        spotify_user_id: spotify_user_id.clone(),
        display_name: display_name.clone(),
        refresh_token,
        scope: grant.scope.unwrap_or_default(),
        created_at: Utc::now(),
    };
    let payload = serde_json::to_vec(&record).map_err(|e| CallbackError::Storage(e.into()))?;

    let secret_id = format!("{}{}", state.config.secret_prefix, spotify_user_id);
    state
        .secret_store
        .ensure_and_append(&secret_id, &payload)
        .await
        .map_err(CallbackError::Storage)?;

    info!(spotify_user_id = %spotify_user_id, "Listener onboarded");

    Ok(Html(pages::success_page(&display_name, &spotify_user_id)))
}
