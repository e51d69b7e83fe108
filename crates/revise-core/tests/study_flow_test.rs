//! Integration tests for the full study flow.
//!
//! Drives the public Engine API against an in-memory SQLite store: session
//! start, rating submissions with re-queueing, completion, and the
//! standalone quality-scale review path.

use std::sync::Arc;

use revise_core::{Engine, EngineConfig, ReviseError, Scope, SqliteStore};

async fn engine_with_cards(card_count: usize) -> (Engine, Scope, Vec<i64>) {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let engine = Engine::new(EngineConfig::default(), store);

    let deck = engine.create_deck(1, "Rust", None).await.unwrap();
    let mut card_ids = Vec::new();
    for i in 0..card_count {
        let card = engine
            .create_card(1, deck.id, format!("front {i}"), format!("back {i}"))
            .await
            .unwrap();
        card_ids.push(card.id);
    }
    (engine, Scope::new(1, deck.id), card_ids)
}

/// A session over all-new cards, rated Good throughout, completes after one
/// pass and leaves every card scheduled one day out.
#[tokio::test]
async fn test_clean_session_pass() {
    let (engine, scope, card_ids) = engine_with_cards(3).await;

    let overview = engine.study(scope).await.unwrap().unwrap();
    assert_eq!(overview.total_cards, 3);
    assert_eq!(overview.new_cards.len(), 3);
    assert!(overview.due_cards.is_empty());

    let mut completed = false;
    for &card_id in &card_ids {
        let outcome = engine.review(scope, card_id, 3, Some(1200)).await.unwrap();
        assert!(!outcome.requeued);
        assert_eq!(outcome.card.state.interval, 1);
        assert_eq!(outcome.card.state.repetitions, 1);
        completed = outcome.completed;
    }
    assert!(completed);

    // Everything is scheduled tomorrow; nothing left to study today.
    assert!(engine.study(scope).await.unwrap().is_none());
}

/// A card rated Again comes back later in the same session and must be
/// mastered before the session completes.
#[tokio::test]
async fn test_failed_card_returns_before_completion() {
    let (engine, scope, card_ids) = engine_with_cards(3).await;
    engine.study(scope).await.unwrap().unwrap();

    let outcome = engine.review(scope, card_ids[0], 1, None).await.unwrap();
    assert!(outcome.requeued);
    assert!(!outcome.completed);
    assert_eq!(outcome.session.cards_reviewed, 0);
    // Again stores the card as due immediately with repetitions reset.
    assert_eq!(outcome.card.state.interval, 0);
    assert_eq!(outcome.card.state.repetitions, 0);

    engine.review(scope, card_ids[1], 3, None).await.unwrap();
    engine.review(scope, card_ids[2], 3, None).await.unwrap();

    // The failed card is back at the head of the queue.
    let outcome = engine.review(scope, card_ids[0], 3, None).await.unwrap();
    assert!(outcome.completed);
    assert_eq!(outcome.session.cards_reviewed, 3);
}

/// Submitting a card that is not at the head of the queue is a conflict and
/// changes nothing.
#[tokio::test]
async fn test_out_of_order_submission_is_rejected() {
    let (engine, scope, card_ids) = engine_with_cards(2).await;
    engine.study(scope).await.unwrap().unwrap();

    let err = engine.review(scope, card_ids[1], 3, None).await.unwrap_err();
    assert!(matches!(err, ReviseError::Conflict { .. }));

    // The head card still goes through normally.
    let outcome = engine.review(scope, card_ids[0], 3, None).await.unwrap();
    assert!(!outcome.completed);
    assert_eq!(outcome.session.cards_reviewed, 1);
}

/// Starting a study session twice resumes the same session rather than
/// creating a second active one.
#[tokio::test]
async fn test_study_resumes_active_session() {
    let (engine, scope, card_ids) = engine_with_cards(4).await;

    let first = engine.study(scope).await.unwrap().unwrap();
    engine.review(scope, card_ids[0], 3, None).await.unwrap();

    let resumed = engine.study(scope).await.unwrap().unwrap();
    assert_eq!(resumed.session.id, first.session.id);
    assert_eq!(resumed.session.cards_reviewed, 1);
    assert_eq!(resumed.total_cards, 4);
    // Only the three pending cards appear in the resume overview.
    assert_eq!(resumed.new_cards.len() + resumed.due_cards.len(), 3);
}

/// Cards from nested subdecks are studied through the parent deck's scope.
#[tokio::test]
async fn test_subdeck_cards_study_through_parent() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let engine = Engine::new(EngineConfig::default(), store);

    let root = engine.create_deck(1, "Languages", None).await.unwrap();
    let child = engine
        .create_deck(1, "Spanish", Some(root.id))
        .await
        .unwrap();
    engine.create_card(1, root.id, "hola", "hello").await.unwrap();
    engine
        .create_card(1, child.id, "gato", "cat")
        .await
        .unwrap();

    let overview = engine.study(Scope::new(1, root.id)).await.unwrap().unwrap();
    assert_eq!(overview.total_cards, 2);

    // Studying only the child sees only its own card, independently of the
    // parent's session.
    let child_overview = engine
        .study(Scope::new(1, child.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(child_overview.total_cards, 1);
}

/// The standalone quality path and the session path see the same card
/// state: a standalone review moves next_review_at into the future, which
/// removes the card from the due pull.
#[tokio::test]
async fn test_standalone_review_and_session_share_state() {
    let (engine, scope, card_ids) = engine_with_cards(1).await;

    let card = engine.review_standalone(card_ids[0], 1, 5).await.unwrap();
    assert_eq!(card.state.repetitions, 1);
    assert_eq!(card.state.ease_factor, 260);

    // No longer new, not yet due.
    assert!(engine.study(scope).await.unwrap().is_none());
}

/// Quality values outside 0-5 and rating values outside 1-4 are rejected
/// without touching the card.
#[tokio::test]
async fn test_out_of_range_values_rejected() {
    let (engine, scope, card_ids) = engine_with_cards(1).await;

    let err = engine
        .review_standalone(card_ids[0], 1, 6)
        .await
        .unwrap_err();
    assert!(matches!(err, ReviseError::Validation { .. }));

    engine.study(scope).await.unwrap().unwrap();
    let err = engine.review(scope, card_ids[0], 0, None).await.unwrap_err();
    assert!(matches!(err, ReviseError::Validation { .. }));

    let card = engine.card(card_ids[0], 1).await.unwrap();
    assert!(card.is_new());
}

/// Ownership is enforced: another user cannot see or review the card.
#[tokio::test]
async fn test_cards_are_scoped_to_their_owner() {
    let (engine, _, card_ids) = engine_with_cards(1).await;

    let err = engine.card(card_ids[0], 2).await.unwrap_err();
    assert!(matches!(err, ReviseError::NotFound { .. }));

    let err = engine
        .review_standalone(card_ids[0], 2, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, ReviseError::NotFound { .. }));
}
