//! Standalone review endpoint.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use revise_core::Card;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::require_user_id;

/// Request body for a standalone review.
#[derive(Debug, Deserialize)]
pub struct ReviewCardRequest {
    /// Recall quality 0 (blackout) through 5 (perfect).
    pub quality: i64,
}

/// Review a card outside any session, on the 0-5 quality scale.
/// POST /cards/:id/review
pub async fn review_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(card_id): Path<i64>,
    Json(request): Json<ReviewCardRequest>,
) -> ApiResult<Json<Card>> {
    let user_id = require_user_id(&headers)?;
    let card = state
        .engine
        .review_standalone(card_id, user_id, request.quality)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(card))
}
