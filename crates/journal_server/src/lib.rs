//! Journal REST service
//!
//! Accounts, bearer sessions and per-user journal entries over JSON.
//!
//! ## Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 3000)
//! - `DATABASE_PATH`: Path to SQLite database (default: ./journal.db)
//! - `SESSION_EXPIRY_DAYS`: Session token expiration (default: 30)
//! - `CORS_ORIGINS`: Comma-separated list of allowed origins (default: any)
//! - `RUST_LOG`: Log filter (default: `journal_server=debug,tower_http=debug`)

pub mod auth;
pub mod config;
pub mod db;
pub mod handlers;

pub use config::Config;

use axum::{
    Router,
    extract::Extension,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::AuthExtractor;
use crate::handlers::{AppState, journal_routes, user_routes};

/// Build the CORS layer from the configured origins
pub fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if config.allows_any_origin() {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Build the full application router
pub fn app(state: AppState, config: &Config) -> Router {
    let auth_extractor = AuthExtractor::new(state.repo.clone());

    Router::new()
        // Health check
        .route("/", get(|| async { "Journal API is running" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api/users", user_routes(state.clone()))
        .nest("/api/journal", journal_routes(state))
        // Add layers
        .layer(Extension(auth_extractor))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}
