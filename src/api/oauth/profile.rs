//! Authenticated-user profile fetch.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// Spotify profile, reduced to the fields onboarding needs.
///
/// `id` stays optional at the wire level; validating its presence is the
/// callback handler's job so that "profile endpoint failed" and "profile had
/// no id" stay distinguishable outcomes.
#[derive(Deserialize, Debug)]
pub struct SpotifyProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Fetch the profile of the user the access token belongs to.
pub async fn fetch_profile(
    client: &reqwest::Client,
    profile_url: &str,
    access_token: &str,
) -> Result<SpotifyProfile> {
    let response = client
        .get(profile_url)
        .bearer_auth(access_token)
        .send()
        .await
        .context("Failed to send profile request")?;

    if !response.status().is_success() {
        return Err(anyhow!("Profile request failed: {}", response.status()));
    }

    response
        .json::<SpotifyProfile>()
        .await
        .context("Failed to parse profile response")
}
