use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

use encore::api::{
    create_admin_router, create_oauth_router, AdminAppState, OAuthAppState, SpotifyEndpoints,
};
use encore::config::AppConfig;
use encore::secrets::{SecretStore, TokenSource};

/// Timeout for every outbound call (Spotify, Secret Manager, metadata server).
const HTTP_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore=info".into()),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    info!("Encore starting...");

    // One shared client for all outbound calls; bounded wait, fail closed.
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")?;

    let token_source = TokenSource::new(http_client.clone());
    let secret_store = Arc::new(SecretStore::new(
        config.gcp_project.clone(),
        http_client.clone(),
        token_source,
    ));

    let oauth_state = OAuthAppState {
        config: config.clone(),
        endpoints: SpotifyEndpoints::default(),
        http_client,
        secret_store: secret_store.clone(),
    };
    let admin_state = AdminAppState {
        config: config.clone(),
        secret_store,
    };

    let app = Router::new()
        .merge(create_oauth_router(oauth_state))
        .merge(create_admin_router(admin_state))
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Encore listening");

    axum::serve(listener, app).await?;

    Ok(())
}
