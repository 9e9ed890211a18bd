//! Service-account access tokens from the GCE metadata server.
//!
//! On Cloud Run / GCE the metadata server hands out short-lived access tokens
//! for the instance's service account. Tokens are cached in memory and
//! re-fetched once they come within a minute of expiry.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::{Arc, Mutex};

const METADATA_BASE_URL: &str = "http://metadata.google.internal";
const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh when the cached token has less than this long to live.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Cached access-token provider for Secret Manager calls.
#[derive(Clone)]
pub struct TokenSource {
    http_client: reqwest::Client,
    base_url: String,
    cached: Arc<Mutex<Option<CachedToken>>>,
}

impl TokenSource {
    /// Create a source backed by the real metadata server.
    pub fn new(http_client: reqwest::Client) -> Self {
        Self::with_base_url(http_client, METADATA_BASE_URL.to_string())
    }

    /// Create a source with a custom metadata URL (for testing with a mock server).
    pub fn with_base_url(http_client: reqwest::Client, base_url: String) -> Self {
        Self {
            http_client,
            base_url,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Return a valid access token, fetching a fresh one if the cache is
    /// empty or close to expiry.
    pub async fn token(&self) -> Result<String> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let fresh = self.fetch_token().await?;
        let access_token = fresh.access_token.clone();
        *self.cached.lock().unwrap() = Some(fresh);

        Ok(access_token)
    }

    fn cached_token(&self) -> Option<String> {
        let cached = self.cached.lock().unwrap();
        let entry = cached.as_ref()?;

        if entry.expires_at - Utc::now() < Duration::seconds(EXPIRY_MARGIN_SECS) {
            return None;
        }

        Some(entry.access_token.clone())
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        let response = self
            .http_client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .context("Failed to reach metadata server")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Metadata server returned {} for service-account token",
                response.status()
            ));
        }

        let token: MetadataTokenResponse = response
            .json()
            .await
            .context("Failed to parse metadata token response")?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}
