//! Deck and card management endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use revise_core::{Card, Deck};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::require_user_id;

/// Request body for creating a deck.
#[derive(Debug, Deserialize)]
pub struct CreateDeckRequest {
    pub name: String,
    /// Optional parent deck for nesting.
    pub parent_deck_id: Option<i64>,
}

/// Create a deck.
/// POST /decks
pub async fn create_deck(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateDeckRequest>,
) -> ApiResult<Json<Deck>> {
    let user_id = require_user_id(&headers)?;
    let deck = state
        .engine
        .create_deck(user_id, request.name, request.parent_deck_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(deck))
}

/// Response for listing decks.
#[derive(Debug, Serialize)]
pub struct ListDecksResponse {
    pub results: Vec<Deck>,
}

/// List the requesting user's decks.
/// GET /decks
pub async fn list_decks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ListDecksResponse>> {
    let user_id = require_user_id(&headers)?;
    let results = state.engine.decks(user_id).await.map_err(ApiError::from)?;
    Ok(Json(ListDecksResponse { results }))
}

/// Request body for creating a card.
#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub front: String,
    pub back: String,
}

/// Create a card in a deck.
/// POST /decks/:id/cards
pub async fn create_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(deck_id): Path<i64>,
    Json(request): Json<CreateCardRequest>,
) -> ApiResult<Json<Card>> {
    let user_id = require_user_id(&headers)?;
    let card = state
        .engine
        .create_card(user_id, deck_id, request.front, request.back)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(card))
}
