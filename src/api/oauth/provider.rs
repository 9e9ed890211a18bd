//! Spotify endpoint set and authorization-URL construction.

use uuid::Uuid;

use crate::config::AppConfig;

/// Spotify endpoints. Defaults target the real service; tests substitute a
/// mock server.
#[derive(Clone, Debug)]
pub struct SpotifyEndpoints {
    /// Authorization dialog URL
    pub authorize_url: String,

    /// Token exchange endpoint
    pub token_url: String,

    /// Authenticated-user profile endpoint
    pub profile_url: String,
}

impl Default for SpotifyEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: "https://accounts.spotify.com/authorize".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            profile_url: "https://api.spotify.com/v1/me".to_string(),
        }
    }
}

impl SpotifyEndpoints {
    /// Build the authorization URL for the configured client.
    ///
    /// `show_dialog` and `prompt=consent` force Spotify to re-display the
    /// login dialog and re-ask for consent even for listeners who authorized
    /// before. A caller-supplied `state` is used verbatim; otherwise a fresh
    /// random token is generated per attempt.
    pub fn build_auth_url(&self, config: &AppConfig, state: Option<&str>) -> String {
        let state = state.map(str::to_string).unwrap_or_else(generate_state);
        let params = [
            ("client_id", config.spotify_client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.spotify_redirect_uri.as_str()),
            ("scope", config.spotify_scopes.as_str()),
            ("show_dialog", "true"),
            ("response_mode", "query"),
            ("prompt", "consent"),
            ("state", state.as_str()),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.authorize_url, query)
    }
}

/// Random per-attempt state token, `st-` plus 8 hex chars. Collision
/// resistance is all that matters here; the value is echoed back on callback
/// but not validated against anything.
fn generate_state() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("st-{}", &hex[..8])
}
