// HTTP APIs

pub mod admin;
pub mod oauth;
pub mod pages;

pub use admin::{create_admin_router, AdminAppState};
pub use oauth::{create_oauth_router, OAuthAppState, SpotifyEndpoints};
