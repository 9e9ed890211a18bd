// Integration tests for the admin read surface (x-api-key gate, listing,
// verbatim token payloads), with Secret Manager stood in by mockito.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use encore::api::{create_admin_router, AdminAppState};
use encore::config::AppConfig;
use encore::secrets::{SecretStore, TokenSource};
use mockito::{Matcher, Server, ServerGuard};
use std::sync::Arc;
use tower::ServiceExt;

const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

fn test_config() -> AppConfig {
    AppConfig {
        spotify_client_id: "client-id".to_string(),
        spotify_client_secret: "client-secret".to_string(),
        spotify_redirect_uri: "http://localhost:8080/auth/callback".to_string(),
        spotify_scopes: "user-read-email".to_string(),
        app_url: "http://localhost:8080".to_string(),
        admin_api_key: "admin-key".to_string(),
        gcp_project: "test-project".to_string(),
        secret_prefix: "spotify1-refresh-".to_string(),
        listen_port: 8080,
    }
}

async fn test_app(server: &mut ServerGuard) -> Router {
    server
        .mock("GET", METADATA_TOKEN_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"sa-token","expires_in":3599,"token_type":"Bearer"}"#)
        .create_async()
        .await;

    let client = reqwest::Client::new();
    let state = AdminAppState {
        config: Arc::new(test_config()),
        secret_store: Arc::new(SecretStore::with_base_url(
            "test-project".to_string(),
            client.clone(),
            TokenSource::with_base_url(client, server.url()),
            server.url(),
        )),
    };
    create_admin_router(state)
}

async fn get(app: Router, uri: &str, api_key: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }

    let response = app
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn access_body(payload: &str) -> String {
    format!(r#"{{"payload":{{"data":"{}"}}}}"#, BASE64.encode(payload))
}

#[tokio::test]
async fn test_list_users_requires_api_key() {
    let mut server = Server::new_async().await;
    // No store call may happen before the gate
    let list = server
        .mock("GET", "/v1/projects/test-project/secrets")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let app = test_app(&mut server).await;

    let (status, _) = get(app.clone(), "/admin/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(app, "/admin/users", Some("wrong-key")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    list.assert_async().await;
}

#[tokio::test]
async fn test_get_token_requires_api_key() {
    let mut server = Server::new_async().await;
    let app = test_app(&mut server).await;

    let (status, _) = get(app.clone(), "/internal/get-token/u789", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(app, "/internal/get-token/u789", Some("wrong-key")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_users_projects_id_and_name() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/projects/test-project/secrets")
        .match_query(Matcher::UrlEncoded("pageSize".into(), "300".into()))
        .with_status(200)
        .with_body(
            r#"{
                "secrets": [
                    {"name": "projects/test-project/secrets/spotify1-refresh-u789"},
                    {"name": "projects/test-project/secrets/other-app-secret"},
                    {"name": "projects/test-project/secrets/spotify1-refresh-u123"}
                ]
            }"#,
        )
        .create_async()
        .await;
    server
        .mock(
            "GET",
            "/v1/projects/test-project/secrets/spotify1-refresh-u789/versions/latest:access",
        )
        .with_status(200)
        .with_body(access_body(
            r#"{"spotify_user_id":"u789","display_name":"Jane","refresh_token":"RT1"}"#,
        ))
        .create_async()
        .await;
    server
        .mock(
            "GET",
            "/v1/projects/test-project/secrets/spotify1-refresh-u123/versions/latest:access",
        )
        .with_status(200)
        .with_body(access_body(
            r#"{"spotify_user_id":"u123","display_name":"","refresh_token":"RT2"}"#,
        ))
        .create_async()
        .await;
    let app = test_app(&mut server).await;

    let (status, body) = get(app, "/admin/users", Some("admin-key")).await;

    assert_eq!(status, StatusCode::OK);
    let users: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(users.as_array().unwrap().len(), 2);
    assert_eq!(users[0]["spotify_user_id"], "u789");
    assert_eq!(users[0]["display_name"], "Jane");
    assert_eq!(users[1]["spotify_user_id"], "u123");
    // The stored refresh tokens are never projected into the listing
    assert!(!body.contains("RT1"));
    assert!(!body.contains("RT2"));
}

#[tokio::test]
async fn test_list_users_skips_unreadable_payloads() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/projects/test-project/secrets")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{
                "secrets": [
                    {"name": "projects/test-project/secrets/spotify1-refresh-u789"},
                    {"name": "projects/test-project/secrets/spotify1-refresh-broken"}
                ]
            }"#,
        )
        .create_async()
        .await;
    server
        .mock(
            "GET",
            "/v1/projects/test-project/secrets/spotify1-refresh-u789/versions/latest:access",
        )
        .with_status(200)
        .with_body(access_body(r#"{"spotify_user_id":"u789","display_name":"Jane"}"#))
        .create_async()
        .await;
    // Secret exists but its latest version cannot be accessed
    server
        .mock(
            "GET",
            "/v1/projects/test-project/secrets/spotify1-refresh-broken/versions/latest:access",
        )
        .with_status(404)
        .create_async()
        .await;
    let app = test_app(&mut server).await;

    let (status, body) = get(app, "/admin/users", Some("admin-key")).await;

    assert_eq!(status, StatusCode::OK);
    let users: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["spotify_user_id"], "u789");
}

#[tokio::test]
async fn test_get_token_returns_payload_verbatim() {
    let mut server = Server::new_async().await;
    let payload = r#"{"spotify_user_id":"u789","display_name":"Jane","refresh_token":"RT1","scope":"user-read-email","created_at":"2026-08-07T12:00:00Z"}"#;
    server
        .mock(
            "GET",
            "/v1/projects/test-project/secrets/spotify1-refresh-u789/versions/latest:access",
        )
        .with_status(200)
        .with_body(access_body(payload))
        .create_async()
        .await;
    let app = test_app(&mut server).await;

    let (status, body) = get(app, "/internal/get-token/u789", Some("admin-key")).await;

    assert_eq!(status, StatusCode::OK);
    let returned: serde_json::Value = serde_json::from_str(&body).unwrap();
    let expected: serde_json::Value = serde_json::from_str(payload).unwrap();
    assert_eq!(returned, expected);
}

#[tokio::test]
async fn test_get_token_unknown_user_is_404() {
    let mut server = Server::new_async().await;
    server
        .mock(
            "GET",
            "/v1/projects/test-project/secrets/spotify1-refresh-nobody/versions/latest:access",
        )
        .with_status(404)
        .create_async()
        .await;
    let app = test_app(&mut server).await;

    let (status, _) = get(app, "/internal/get-token/nobody", Some("admin-key")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
