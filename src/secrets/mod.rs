//! Secret Manager storage for refresh credentials.
//!
//! Each onboarded listener maps to exactly one secret named
//! `<prefix><spotify_user_id>`; re-onboarding the same listener appends a new
//! version to that secret rather than creating a second one, so "latest
//! version" is always the most recent successful onboarding. Nothing here
//! knows about OAuth; the adapter moves opaque payload bytes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │       SecretStore                        │
//! │  - ensure_and_append (create-or-version) │
//! │  - get_latest (fail-soft to None)        │
//! │  - list_by_prefix                        │
//! └─────────────────────────────────────────┘
//!          ↓ bearer token
//! ┌─────────────────────────────────────────┐
//! │       TokenSource                        │
//! │  - GCE metadata server                   │
//! │  - in-memory cache until near expiry     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Failure semantics
//!
//! Writes (`ensure_and_append`) propagate errors, since onboarding must not
//! report success when persistence failed. Reads (`get_latest`) swallow everything
//! and surface absence; callers treat a missing secret and a broken read
//! identically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod store;
mod token_source;

pub use store::SecretStore;
pub use token_source::TokenSource;

/// The payload persisted per onboarding, one secret version each.
///
/// `refresh_token` is the durable credential; the access token obtained
/// during onboarding is discarded once the profile is fetched and is never
/// stored or logged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Spotify's stable identifier for the listener
    pub spotify_user_id: String,

    /// Informational only; may be empty
    pub display_name: String,

    /// Long-lived OAuth refresh token
    pub refresh_token: String,

    /// Space-delimited scopes Spotify actually granted
    pub scope: String,

    /// Write time (UTC)
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_record_serialization() {
        let record = CredentialRecord {
            spotify_user_id: "u789".to_string(),
            display_name: "Jane".to_string(),
            refresh_token: "RT1".to_string(),
            scope: "user-read-email".to_string(),
            created_at: "2026-08-07T12:00:00Z".parse().unwrap(),
        };

        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["spotify_user_id"], "u789");
        assert_eq!(json["display_name"], "Jane");
        assert_eq!(json["refresh_token"], "RT1");
        assert_eq!(json["scope"], "user-read-email");
        // RFC 3339 timestamp
        assert!(json["created_at"].as_str().unwrap().starts_with("2026-08-07T12:00:00"));
    }

    #[test]
    fn test_credential_record_round_trip_from_store_payload() {
        // Payloads read back from the store are plain JSON objects
        let json = r#"{
            "spotify_user_id": "u789",
            "display_name": "",
            "refresh_token": "RT1",
            "scope": "",
            "created_at": "2026-08-07T12:00:00Z"
        }"#;

        let record: CredentialRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.spotify_user_id, "u789");
        assert!(record.display_name.is_empty());
    }
}
