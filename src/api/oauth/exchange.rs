//! Authorization-code → token exchange.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// Token endpoint response.
///
/// Every field is optional on the wire so the caller can distinguish a
/// successful exchange that came back without the expected tokens from an
/// exchange that failed outright.
#[derive(Deserialize, Debug)]
pub struct TokenGrant {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Exchange an authorization code for tokens.
///
/// Form-encoded POST authenticated with HTTP Basic client credentials, as
/// Spotify's token endpoint requires. The redirect URI must be exactly the
/// one used to obtain the code. Non-2xx responses and transport failures are
/// errors; the error text may carry the provider's response body (never
/// tokens, since a failed exchange has none).
pub async fn exchange_code(
    client: &reqwest::Client,
    token_url: &str,
    code: &str,
    redirect_uri: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<TokenGrant> {
    let form_data = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
    ];

    tracing::debug!("Exchanging authorization code at {}", token_url);

    let response = client
        .post(token_url)
        .basic_auth(client_id, Some(client_secret))
        .header("Accept", "application/json")
        .form(&form_data)
        .send()
        .await
        .context("Failed to send token exchange request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(anyhow!(
            "Token exchange failed with status {}: {}",
            status,
            body
        ));
    }

    response
        .json::<TokenGrant>()
        .await
        .context("Failed to parse token response")
}
