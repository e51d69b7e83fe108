//! Study session endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use revise_core::{ReviewOutcome, Scope, StudyOverview};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::require_user_id;

/// Response for starting a study session.
///
/// `study` is null when there is nothing to study right now.
#[derive(Debug, Serialize)]
pub struct StudyResponse {
    pub study: Option<StudyOverview>,
}

/// Start or resume a study session over a deck and its subdecks.
/// GET /decks/:id/study
pub async fn start_study(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(deck_id): Path<i64>,
) -> ApiResult<Json<StudyResponse>> {
    let user_id = require_user_id(&headers)?;
    let study = state
        .engine
        .study(Scope::new(user_id, deck_id))
        .await
        .map_err(ApiError::from)?;
    Ok(Json(StudyResponse { study }))
}

/// Request body for submitting a rating.
#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    /// The card being rated; must be the session's current card.
    pub card_id: i64,
    /// Rating 1 (Again) through 4 (Easy).
    pub rating: i64,
    /// Milliseconds the learner spent before answering.
    pub time_taken_ms: Option<i64>,
}

/// Submit a rating for the current card of the deck's session.
/// POST /decks/:id/study
pub async fn submit_rating(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(deck_id): Path<i64>,
    Json(request): Json<SubmitRatingRequest>,
) -> ApiResult<Json<ReviewOutcome>> {
    let user_id = require_user_id(&headers)?;
    let outcome = state
        .engine
        .review(
            Scope::new(user_id, deck_id),
            request.card_id,
            request.rating,
            request.time_taken_ms,
        )
        .await
        .map_err(ApiError::from)?;
    Ok(Json(outcome))
}
