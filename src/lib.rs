// Environment configuration
pub mod config;

// Secret Manager storage for refresh credentials
pub mod secrets;

// HTTP API (OAuth flow, admin surface)
pub mod api;
