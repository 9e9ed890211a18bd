//! Environment-sourced configuration.
//!
//! Loaded once at process start and passed into components as an immutable
//! `Arc<AppConfig>`. Required variables fail fast with the variable name so a
//! misconfigured deployment dies on boot rather than mid-flow.

use anyhow::{anyhow, Result};

/// Scopes requested during authorization when `ENCORE_SPOTIFY_SCOPES` is unset.
///
/// Read-only scopes covering profile, listening history, library and playlists.
/// The scopes Spotify actually grants are recorded per user at onboarding time.
pub const DEFAULT_SCOPES: &str = "user-read-private user-read-email user-read-recently-played user-top-read user-library-read playlist-read-private playlist-read-collaborative user-follow-read";

/// Secret-name prefix when `ENCORE_SECRET_PREFIX` is unset.
pub const DEFAULT_SECRET_PREFIX: &str = "spotify1-refresh-";

const DEFAULT_PORT: u16 = 8080;

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Spotify application client id
    pub spotify_client_id: String,

    /// Spotify application client secret (used for HTTP Basic auth on token exchange)
    pub spotify_client_secret: String,

    /// Redirect URI registered with Spotify; must match on authorize and exchange
    pub spotify_redirect_uri: String,

    /// Space-delimited scope string requested during authorization
    pub spotify_scopes: String,

    /// Public base URL of this service (shown on the connect page)
    pub app_url: String,

    /// Shared secret expected in the `x-api-key` header on admin endpoints
    pub admin_api_key: String,

    /// GCP project that owns the refresh-token secrets
    pub gcp_project: String,

    /// Prefix for per-user secret names (`prefix + spotify_user_id`)
    pub secret_prefix: String,

    /// HTTP listen port (Cloud Run injects `PORT`)
    pub listen_port: u16,
}

impl AppConfig {
    /// Build from env vars. Errors name the missing variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            spotify_client_id: required("ENCORE_SPOTIFY_CLIENT_ID")?,
            spotify_client_secret: required("ENCORE_SPOTIFY_CLIENT_SECRET")?,
            spotify_redirect_uri: required("ENCORE_SPOTIFY_REDIRECT_URI")?,
            spotify_scopes: std::env::var("ENCORE_SPOTIFY_SCOPES")
                .unwrap_or_else(|_| DEFAULT_SCOPES.to_string()),
            app_url: required("ENCORE_APP_URL")?,
            admin_api_key: required("ENCORE_ADMIN_API_KEY")?,
            gcp_project: required("ENCORE_GCP_PROJECT")?,
            secret_prefix: std::env::var("ENCORE_SECRET_PREFIX")
                .unwrap_or_else(|_| DEFAULT_SECRET_PREFIX.to_string()),
            listen_port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
        })
    }
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| anyhow!("Missing required environment variable: {}", name))
}
