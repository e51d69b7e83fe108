//! revise-server - REST API server for revise.
//!
//! This crate exposes the revise engine over HTTP: deck and card
//! management, study sessions, and standalone reviews. Callers identify
//! themselves with an `x-user-id` header.
//!
//! # Example
//!
//! ```ignore
//! use revise_server::{create_server, AppState};
//! use revise_core::EngineConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = AppState::with_sqlite(EngineConfig::default()).unwrap();
//!     let app = create_server(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

/// Create the server with authentication middleware, reading the expected
/// key from `REVISE_API_KEY` once.
pub fn create_server_with_auth(state: AppState) -> Router {
    let api_key = std::env::var("REVISE_API_KEY").unwrap_or_default();
    create_server_with_api_key(state, api_key)
}

/// Create the server with authentication against a fixed API key.
pub fn create_server_with_api_key(state: AppState, api_key: String) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(move |request, next| {
            middleware::auth_middleware(api_key.clone(), request, next)
        }))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
