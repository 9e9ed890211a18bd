//! Secret Manager REST adapter.
//!
//! Speaks the `secretmanager.googleapis.com` v1 API directly over reqwest,
//! authenticating each call with a service-account token from [`TokenSource`].
//! Secret payloads are base64 on the wire in both directions.

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::TokenSource;

const SECRET_MANAGER_BASE_URL: &str = "https://secretmanager.googleapis.com";
const LIST_PAGE_SIZE: u32 = 300;

#[derive(Deserialize)]
struct SecretVersionPayload {
    data: String,
}

#[derive(Deserialize)]
struct AccessVersionResponse {
    payload: SecretVersionPayload,
}

#[derive(Deserialize)]
struct SecretResource {
    /// Full resource name, `projects/<p>/secrets/<id>`
    name: String,
}

#[derive(Deserialize)]
struct ListSecretsResponse {
    #[serde(default)]
    secrets: Vec<SecretResource>,
    #[serde(default, rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// Handle on one project's secrets. Long-lived; constructed once at startup
/// and injected into the components that persist or read credentials.
pub struct SecretStore {
    project_id: String,
    http_client: reqwest::Client,
    token_source: TokenSource,
    base_url: String,
}

impl SecretStore {
    /// Create a store against the real Secret Manager endpoint.
    pub fn new(project_id: String, http_client: reqwest::Client, token_source: TokenSource) -> Self {
        Self::with_base_url(
            project_id,
            http_client,
            token_source,
            SECRET_MANAGER_BASE_URL.to_string(),
        )
    }

    /// Create a store with a custom API base URL (for testing with a mock server).
    pub fn with_base_url(
        project_id: String,
        http_client: reqwest::Client,
        token_source: TokenSource,
        base_url: String,
    ) -> Self {
        Self {
            project_id,
            http_client,
            token_source,
            base_url,
        }
    }

    /// Create the secret if it does not exist, then append `payload` as a new
    /// version.
    ///
    /// The existence check and the create are not atomic: two concurrent
    /// first-time onboardings can both attempt creation, so a 409 from the
    /// create is treated as "someone else won the race" and the version
    /// append proceeds regardless. Every other failure propagates; the
    /// caller must not report success when persistence failed.
    pub async fn ensure_and_append(&self, secret_id: &str, payload: &[u8]) -> Result<()> {
        let token = self.token_source.token().await?;

        let secret_url = format!(
            "{}/v1/projects/{}/secrets/{}",
            self.base_url, self.project_id, secret_id
        );
        let lookup = self
            .http_client
            .get(&secret_url)
            .bearer_auth(&token)
            .send()
            .await
            .context("Failed to look up secret")?;

        match lookup.status() {
            s if s.is_success() => {
                debug!(secret = %secret_id, "Secret exists, appending version");
            }
            StatusCode::NOT_FOUND => {
                self.create_secret(&token, secret_id).await?;
            }
            s => {
                return Err(anyhow!("Secret lookup failed: {}", s));
            }
        }

        let add_version_url = format!("{}:addVersion", secret_url);
        let response = self
            .http_client
            .post(&add_version_url)
            .bearer_auth(&token)
            .json(&json!({
                "payload": { "data": BASE64.encode(payload) }
            }))
            .send()
            .await
            .context("Failed to add secret version")?;

        if !response.status().is_success() {
            return Err(anyhow!("Adding secret version failed: {}", response.status()));
        }

        debug!(secret = %secret_id, "Secret version added");
        Ok(())
    }

    async fn create_secret(&self, token: &str, secret_id: &str) -> Result<()> {
        let create_url = format!(
            "{}/v1/projects/{}/secrets?secretId={}",
            self.base_url,
            self.project_id,
            urlencoding::encode(secret_id)
        );
        let response = self
            .http_client
            .post(&create_url)
            .bearer_auth(token)
            .json(&json!({
                "replication": { "automatic": {} }
            }))
            .send()
            .await
            .context("Failed to create secret")?;

        match response.status() {
            s if s.is_success() => Ok(()),
            // Lost a creation race with a concurrent onboarding; the secret
            // exists now, which is all we need.
            StatusCode::CONFLICT => {
                debug!(secret = %secret_id, "Secret already created concurrently");
                Ok(())
            }
            s => Err(anyhow!("Secret creation failed: {}", s)),
        }
    }

    /// Fetch and parse the latest version's payload.
    ///
    /// Absent secret, no versions, transport errors and unparseable payloads
    /// all surface as `None`; the detail is logged server-side only.
    pub async fn get_latest(&self, secret_id: &str) -> Option<serde_json::Value> {
        match self.try_get_latest(secret_id).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(secret = %secret_id, error = %e, "Failed to read latest secret version");
                None
            }
        }
    }

    async fn try_get_latest(&self, secret_id: &str) -> Result<serde_json::Value> {
        let token = self.token_source.token().await?;

        let url = format!(
            "{}/v1/projects/{}/secrets/{}/versions/latest:access",
            self.base_url, self.project_id, secret_id
        );
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .context("Failed to access secret version")?;

        if !response.status().is_success() {
            return Err(anyhow!("Accessing secret version failed: {}", response.status()));
        }

        let access: AccessVersionResponse = response
            .json()
            .await
            .context("Failed to parse access response")?;

        let bytes = BASE64
            .decode(&access.payload.data)
            .context("Secret payload is not valid base64")?;

        serde_json::from_slice(&bytes).context("Secret payload is not valid JSON")
    }

    /// List short secret names starting with `prefix`, in store order.
    ///
    /// The list API has no server-side prefix filter, so all pages are walked
    /// and filtered here.
    pub async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let token = self.token_source.token().await?;

        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/v1/projects/{}/secrets?pageSize={}",
                self.base_url, self.project_id, LIST_PAGE_SIZE
            );
            if let Some(ref t) = page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(t)));
            }

            let response = self
                .http_client
                .get(&url)
                .bearer_auth(&token)
                .send()
                .await
                .context("Failed to list secrets")?;

            if !response.status().is_success() {
                return Err(anyhow!("Listing secrets failed: {}", response.status()));
            }

            let page: ListSecretsResponse = response
                .json()
                .await
                .context("Failed to parse list response")?;

            names.extend(
                page.secrets
                    .iter()
                    .filter_map(|s| s.name.rsplit('/').next())
                    .filter(|short| short.starts_with(prefix))
                    .map(str::to_string),
            );

            match page.next_page_token {
                Some(t) if !t.is_empty() => page_token = Some(t),
                _ => break,
            }
        }

        Ok(names)
    }
}
