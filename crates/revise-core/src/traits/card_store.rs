//! Card store trait and related types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReviseResult;
use crate::types::{Card, Deck, ReviewEvent, Scope, ScheduleUpdate, StudySession};

#[cfg(test)]
use mockall::automock;

/// Session progress written alongside a card update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub session_id: Uuid,
    pub cards_reviewed: u32,
    pub is_active: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Everything one rating submission persists, applied atomically.
///
/// The session manager must not advance its in-memory pointer until this
/// whole record is durable, so the store applies it in one transaction.
#[derive(Debug, Clone)]
pub struct ReviewTransaction {
    pub card_id: i64,
    pub user_id: i64,
    pub update: ScheduleUpdate,
    pub event: ReviewEvent,
    /// Absent for standalone reviews outside any session.
    pub progress: Option<SessionProgress>,
}

/// Storage collaborator for cards, decks, sessions, and review events.
///
/// The scheduler's durable contract with storage is the four card fields
/// carried by [`ScheduleUpdate`]; everything else here exists to feed the
/// session queue manager. All failures surface as retryable storage errors.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Create a deck. `parent_deck_id` must already exist for the same user.
    async fn create_deck(
        &self,
        user_id: i64,
        name: String,
        parent_deck_id: Option<i64>,
    ) -> ReviseResult<Deck>;

    /// All decks owned by a user, for in-memory descendant resolution.
    async fn decks_for_user(&self, user_id: i64) -> ReviseResult<Vec<Deck>>;

    /// Create a card with new-card scheduling state.
    async fn create_card(
        &self,
        user_id: i64,
        deck_id: i64,
        front: String,
        back: String,
    ) -> ReviseResult<Card>;

    /// Fetch a card, scoped to its owner. Returns None if it does not exist
    /// or belongs to someone else.
    async fn get_card(&self, card_id: i64, user_id: i64) -> ReviseResult<Option<Card>>;

    /// Never-reviewed candidates (`repetitions == 0`) across the given
    /// decks, oldest first, up to `limit`.
    async fn new_cards(
        &self,
        user_id: i64,
        deck_ids: Vec<i64>,
        limit: usize,
    ) -> ReviseResult<Vec<Card>>;

    /// Due candidates (`repetitions > 0 && next_review_at <= now`) across
    /// the given decks, due-soonest first, up to `limit`. When
    /// `repetition_tiers` is set only cards in those tiers qualify.
    async fn due_cards(
        &self,
        user_id: i64,
        deck_ids: Vec<i64>,
        now: DateTime<Utc>,
        repetition_tiers: Option<Vec<u32>>,
        limit: usize,
    ) -> ReviseResult<Vec<Card>>;

    /// Persist one rating submission: the card's new schedule, the review
    /// event, and (for session reviews) the session progress, atomically.
    async fn apply_review(&self, tx: ReviewTransaction) -> ReviseResult<()>;

    /// The active session for a scope, if any.
    async fn active_session(&self, scope: Scope) -> ReviseResult<Option<StudySession>>;

    /// Insert a freshly started session. Fails if the scope already has an
    /// active one (unique-active invariant).
    async fn insert_session(&self, session: &StudySession) -> ReviseResult<()>;

    /// Mark a session inactive, optionally recording completion.
    async fn close_session(
        &self,
        session_id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> ReviseResult<()>;
}
