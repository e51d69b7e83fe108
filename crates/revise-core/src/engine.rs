//! Engine facade tying the scheduler, session manager, and store together.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{ReviseError, ReviseResult};
use crate::scheduler::{preview_intervals, QualityScale};
use crate::session::{ReviewOutcome, SessionManager, StudyOverview};
use crate::storage::SqliteStore;
use crate::traits::{CardStore, ReviewTransaction};
use crate::types::{Card, Deck, Quality, Rating, ReviewEvent, Scope};

/// Main engine struct - the entry point for embedding revise.
///
/// Holds the store and one [`SessionManager`]; all public operations take
/// plain identifiers and raw rating values so callers (the HTTP server
/// included) never need to construct domain types themselves.
pub struct Engine {
    store: Arc<dyn CardStore>,
    sessions: SessionManager,
    quality: QualityScale,
}

impl Engine {
    /// Create an engine over an existing store.
    pub fn new(config: EngineConfig, store: Arc<dyn CardStore>) -> Self {
        let sessions = SessionManager::new(store.clone(), config.study);
        Self {
            store,
            sessions,
            quality: QualityScale,
        }
    }

    /// Create an engine backed by the SQLite store at `config.db_path`.
    pub fn with_sqlite(config: EngineConfig) -> ReviseResult<Self> {
        let store = Arc::new(SqliteStore::new(&config.db_path)?);
        Ok(Self::new(config, store))
    }

    /// Create a deck, optionally nested under `parent_deck_id`.
    pub async fn create_deck(
        &self,
        user_id: i64,
        name: impl Into<String>,
        parent_deck_id: Option<i64>,
    ) -> ReviseResult<Deck> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ReviseError::validation("deck name must not be empty"));
        }
        self.store.create_deck(user_id, name, parent_deck_id).await
    }

    /// All decks owned by a user.
    pub async fn decks(&self, user_id: i64) -> ReviseResult<Vec<Deck>> {
        self.store.decks_for_user(user_id).await
    }

    /// Create a card with new-card scheduling state.
    pub async fn create_card(
        &self,
        user_id: i64,
        deck_id: i64,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> ReviseResult<Card> {
        let (front, back) = (front.into(), back.into());
        if front.trim().is_empty() || back.trim().is_empty() {
            return Err(ReviseError::validation(
                "card front and back must not be empty",
            ));
        }
        self.store.create_card(user_id, deck_id, front, back).await
    }

    /// Fetch a card, scoped to its owner.
    pub async fn card(&self, card_id: i64, user_id: i64) -> ReviseResult<Card> {
        self.store
            .get_card(card_id, user_id)
            .await?
            .ok_or_else(|| ReviseError::card_not_found(card_id))
    }

    /// Start or resume a study session for one user/deck scope.
    ///
    /// `None` means there is nothing to study right now.
    pub async fn study(&self, scope: Scope) -> ReviseResult<Option<StudyOverview>> {
        self.sessions.start(scope, Utc::now()).await
    }

    /// Submit a 1-4 rating for the current card of the scope's session.
    pub async fn review(
        &self,
        scope: Scope,
        card_id: i64,
        rating_value: i64,
        time_taken_ms: Option<i64>,
    ) -> ReviseResult<ReviewOutcome> {
        let rating = Rating::from_value(rating_value)?;
        self.sessions
            .submit_rating(scope, card_id, rating, time_taken_ms, Utc::now())
            .await
    }

    /// Review a card outside any session, using the 0-5 quality scale.
    ///
    /// Returns the card with its recomputed schedule.
    pub async fn review_standalone(
        &self,
        card_id: i64,
        user_id: i64,
        quality_value: i64,
    ) -> ReviseResult<Card> {
        let quality = Quality::from_value(quality_value)?;
        let now = Utc::now();

        let mut card = self.card(card_id, user_id).await?;
        let update = self.quality.next_state(quality, card.state, now);

        self.store
            .apply_review(ReviewTransaction {
                card_id,
                user_id,
                update,
                event: ReviewEvent {
                    card_id,
                    user_id,
                    session_id: None,
                    rating: quality.value(),
                    time_taken_ms: None,
                    reviewed_at: now,
                },
                progress: None,
            })
            .await?;

        card.apply(&update, now);
        debug!(card_id, quality = quality.value(), "standalone review applied");
        Ok(card)
    }

    /// The interval each study button would produce for a card, in button
    /// order (Again, Hard, Good, Easy).
    pub async fn button_intervals(
        &self,
        card_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> ReviseResult<[i32; 4]> {
        let card = self.card(card_id, user_id).await?;
        Ok(preview_intervals(card.state, now))
    }
}
