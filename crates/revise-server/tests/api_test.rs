//! Integration tests for the REST API surface.
//!
//! Drives the router directly with tower's oneshot; no listener involved.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use revise_core::{Engine, EngineConfig, SqliteStore};
use revise_server::{create_server, create_server_with_api_key, AppState};
use tower::ServiceExt;

fn test_state() -> AppState {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    AppState::new(Engine::new(EngineConfig::default(), store))
}

fn json_request(method: &str, uri: &str, user_id: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_server(test_state());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_user_header_is_bad_request() {
    let app = create_server(test_state());
    let response = app
        .oneshot(json_request("POST", "/decks", None, r#"{"name":"Rust"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_deck_and_study_empty() {
    let state = test_state();

    let response = create_server(state.clone())
        .oneshot(json_request("POST", "/decks", Some("1"), r#"{"name":"Rust"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A fresh deck has nothing to study; still a 200 with a null study.
    let deck = state.engine.decks(1).await.unwrap().remove(0);
    let response = create_server(state)
        .oneshot(json_request(
            "GET",
            &format!("/decks/{}/study", deck.id),
            Some("1"),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_out_of_range_quality_is_unprocessable() {
    let state = test_state();
    let deck = state.engine.create_deck(1, "Rust", None).await.unwrap();
    let card = state
        .engine
        .create_card(1, deck.id, "q", "a")
        .await
        .unwrap();

    let response = create_server(state)
        .oneshot(json_request(
            "POST",
            &format!("/cards/{}/review", card.id),
            Some("1"),
            r#"{"quality":6}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_rating_mismatch_is_conflict() {
    let state = test_state();
    let deck = state.engine.create_deck(1, "Rust", None).await.unwrap();
    state.engine.create_card(1, deck.id, "q1", "a1").await.unwrap();
    let second = state
        .engine
        .create_card(1, deck.id, "q2", "a2")
        .await
        .unwrap();

    // Start a session, then rate a card that is not at the head.
    let response = create_server(state.clone())
        .oneshot(json_request(
            "GET",
            &format!("/decks/{}/study", deck.id),
            Some("1"),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = create_server(state)
        .oneshot(json_request(
            "POST",
            &format!("/decks/{}/study", deck.id),
            Some("1"),
            &format!(r#"{{"card_id":{},"rating":3}}"#, second.id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_auth_requires_matching_bearer_token() {
    let state = test_state();

    let response = create_server_with_api_key(state.clone(), "sekrit".into())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = create_server_with_api_key(state.clone(), "sekrit".into())
        .oneshot(
            Request::get("/health")
                .header("Authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = create_server_with_api_key(state, "sekrit".into())
        .oneshot(
            Request::get("/health")
                .header("Authorization", "Bearer sekrit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_deck_is_not_found() {
    let app = create_server(test_state());
    let response = app
        .oneshot(json_request("GET", "/decks/999/study", Some("1"), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
