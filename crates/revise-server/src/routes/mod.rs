//! Route definitions for the REST API.

mod decks;
mod health;
mod review;
mod study;

use axum::{
    http::HeaderMap,
    routing::{get, post},
    Router,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Deck and card management
        .route("/decks", post(decks::create_deck))
        .route("/decks", get(decks::list_decks))
        .route("/decks/:id/cards", post(decks::create_card))
        // Study sessions
        .route("/decks/:id/study", get(study::start_study))
        .route("/decks/:id/study", post(study::submit_rating))
        // Standalone reviews
        .route("/cards/:id/review", post(review::review_card))
        // Attach state
        .with_state(state)
}

/// Resolve the requesting user from the `x-user-id` header.
pub(crate) fn require_user_id(headers: &HeaderMap) -> ApiResult<i64> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("Missing or invalid x-user-id header"))
}

pub use decks::*;
pub use health::*;
pub use review::*;
pub use study::*;
