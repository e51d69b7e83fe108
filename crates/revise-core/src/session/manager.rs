//! Session queue manager.
//!
//! Orchestrates one bounded study pass over a scope: candidate selection,
//! queue order, re-queueing of weakly-recalled cards, and session
//! completion. All mutation for a given scope is serialized behind a
//! per-scope async mutex; distinct scopes proceed independently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::StudyConfig;
use crate::error::{ErrorCode, ReviseError, ReviseResult};
use crate::scheduler::RatingScale;
use crate::traits::{CardStore, ReviewTransaction, SessionProgress};
use crate::types::{Card, Rating, ReviewEvent, Scope, StudySession};

use super::queue::StudyQueue;

/// Snapshot returned when a session starts or resumes.
#[derive(Debug, Clone, Serialize)]
pub struct StudyOverview {
    pub session: StudySession,
    pub new_cards: Vec<Card>,
    pub due_cards: Vec<Card>,
    pub total_cards: u32,
}

/// Result of one rating submission.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    /// The card with its recomputed schedule.
    pub card: Card,
    /// Session progress after this submission.
    pub session: StudySession,
    /// Whether the card was re-queued for another showing this session.
    pub requeued: bool,
    /// Whether this submission completed the session.
    pub completed: bool,
}

/// One scope's live state: the persisted session plus its in-memory queue.
struct ActiveStudy {
    session: StudySession,
    queue: StudyQueue,
}

/// Manages study sessions, one per (user, deck) scope.
pub struct SessionManager {
    store: Arc<dyn CardStore>,
    config: StudyConfig,
    scheduler: RatingScale,
    sessions: Mutex<HashMap<Scope, Arc<Mutex<Option<ActiveStudy>>>>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CardStore>, config: StudyConfig) -> Self {
        Self {
            store,
            config,
            scheduler: RatingScale,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Get the per-scope slot, creating it if needed. The outer map lock is
    /// held only for the lookup; session work happens under the slot lock.
    async fn slot(&self, scope: Scope) -> Arc<Mutex<Option<ActiveStudy>>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(scope)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Resolve a deck and all of its descendants from one bulk fetch.
    ///
    /// Decks form a parent-pointer tree; a visited set guards against
    /// malformed cycles so resolution always terminates.
    async fn resolve_scope_decks(&self, scope: Scope) -> ReviseResult<Vec<i64>> {
        let decks = self.store.decks_for_user(scope.user_id).await?;

        if !decks.iter().any(|d| d.id == scope.deck_id) {
            return Err(ReviseError::deck_not_found(scope.deck_id));
        }

        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for deck in &decks {
            if let Some(parent) = deck.parent_deck_id {
                children.entry(parent).or_default().push(deck.id);
            }
        }

        let mut resolved = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![scope.deck_id];
        while let Some(deck_id) = stack.pop() {
            if !visited.insert(deck_id) {
                warn!(deck_id, "cycle detected in deck tree, skipping revisit");
                continue;
            }
            resolved.push(deck_id);
            if let Some(kids) = children.get(&deck_id) {
                stack.extend(kids);
            }
        }
        Ok(resolved)
    }

    async fn fetch_candidates(
        &self,
        scope: Scope,
        now: DateTime<Utc>,
    ) -> ReviseResult<(Vec<Card>, Vec<Card>)> {
        let deck_ids = self.resolve_scope_decks(scope).await?;
        let new_cards = self
            .store
            .new_cards(scope.user_id, deck_ids.clone(), self.config.new_card_limit)
            .await?;
        let due_cards = self
            .store
            .due_cards(
                scope.user_id,
                deck_ids,
                now,
                self.config.due_repetition_tiers.clone(),
                self.config.due_card_limit,
            )
            .await?;
        Ok((new_cards, due_cards))
    }

    /// Start a session for a scope, or resume the active one.
    ///
    /// Returns `None` when there is nothing to study (a normal outcome, not
    /// an error): no candidates and no resumable session. A stale active
    /// session is reclaimed and replaced.
    pub async fn start(&self, scope: Scope, now: DateTime<Utc>) -> ReviseResult<Option<StudyOverview>> {
        scope.validate()?;

        let slot = self.slot(scope).await;
        let mut active = slot.lock().await;

        let staleness = Duration::hours(self.config.session_staleness_hours);

        // An abandoned in-memory session is reclaimed before the resume
        // check, so a long-running process starts fresh too.
        let stale_id = match active.as_ref() {
            Some(study) if study.session.is_stale(now, staleness) => Some(study.session.id),
            _ => None,
        };
        if let Some(session_id) = stale_id {
            info!(%session_id, "reclaiming stale session");
            self.store.close_session(session_id, None).await?;
            *active = None;
        }

        // Resume the in-memory session if one is live.
        if let Some(study) = active.as_ref() {
            if study.session.is_active {
                debug!(session_id = %study.session.id, "resuming in-memory session");
                let overview = self.overview_from_queue(study).await?;
                return Ok(Some(overview));
            }
        }

        // Reconcile with the store: reclaim stale sessions, rebuild live
        // ones (e.g. after a restart the queue is gone but the row remains).
        let persisted = self.store.active_session(scope).await?;
        let resumed = match persisted {
            Some(session) if session.is_stale(now, staleness) => {
                info!(session_id = %session.id, "reclaiming stale session");
                self.store.close_session(session.id, None).await?;
                None
            }
            other => other,
        };

        let (new_cards, due_cards) = self.fetch_candidates(scope, now).await?;
        let total = (new_cards.len() + due_cards.len()) as u32;

        if total == 0 {
            if let Some(session) = resumed {
                // Nothing left to show for a session we can no longer feed.
                self.store.close_session(session.id, Some(now)).await?;
            }
            debug!(user_id = scope.user_id, deck_id = scope.deck_id, "nothing to study");
            return Ok(None);
        }

        let session = match resumed {
            Some(session) => session,
            None => {
                let session = StudySession::start(scope, total, now);
                self.store.insert_session(&session).await?;
                info!(session_id = %session.id, cards = total, "started study session");
                session
            }
        };

        // New cards first, then due cards; due-soonest first inside each
        // group (the store returns them in that order).
        let queue = StudyQueue::new(
            new_cards
                .iter()
                .chain(due_cards.iter())
                .map(|card| card.id)
                .collect(),
        );

        *active = Some(ActiveStudy {
            session: session.clone(),
            queue,
        });

        Ok(Some(StudyOverview {
            session,
            new_cards,
            due_cards,
            total_cards: total,
        }))
    }

    /// Submit a rating for the card currently at the head of the queue.
    ///
    /// The in-memory pointer only advances after the store has durably
    /// applied the card update, review event, and session progress; a
    /// storage failure leaves the session exactly where it was.
    pub async fn submit_rating(
        &self,
        scope: Scope,
        card_id: i64,
        rating: Rating,
        time_taken_ms: Option<i64>,
        now: DateTime<Utc>,
    ) -> ReviseResult<ReviewOutcome> {
        scope.validate()?;

        let slot = self.slot(scope).await;
        let mut active = slot.lock().await;

        let study = active.as_mut().ok_or_else(|| {
            ReviseError::session_not_found("No active study session for this deck")
        })?;

        let current = study.queue.current().ok_or_else(|| {
            ReviseError::conflict(
                "Session has no cards left to review",
                ErrorCode::SessionAlreadyComplete,
            )
        })?;

        if card_id != current {
            // Stale or duplicate submission; the caller should re-fetch.
            return Err(ReviseError::conflict(
                format!(
                    "Card '{}' is not the current card of this session",
                    card_id
                ),
                ErrorCode::SessionCardMismatch,
            ));
        }

        let mut card = self
            .store
            .get_card(card_id, scope.user_id)
            .await?
            .ok_or_else(|| ReviseError::card_not_found(card_id))?;

        let update = self.scheduler.next_state(rating, card.state, now);

        let requeued = rating.is_weak();
        let mastered = !requeued;
        let cards_reviewed = study.session.cards_reviewed + u32::from(mastered);
        // Mastering the last pending card completes the session; a re-queue
        // never does, since the card is about to be shown again.
        let completed = mastered && study.queue.remaining() == 1;

        let progress = SessionProgress {
            session_id: study.session.id,
            cards_reviewed,
            is_active: !completed,
            completed_at: completed.then_some(now),
        };

        self.store
            .apply_review(ReviewTransaction {
                card_id,
                user_id: scope.user_id,
                update,
                event: ReviewEvent {
                    card_id,
                    user_id: scope.user_id,
                    session_id: Some(study.session.id),
                    rating: rating.value(),
                    time_taken_ms,
                    reviewed_at: now,
                },
                progress: Some(progress),
            })
            .await?;

        // Persistence succeeded; now move the in-memory state.
        if requeued {
            study.queue.requeue_current(self.config.requeue_offset);
        }
        study.queue.advance();
        study.session.cards_reviewed = cards_reviewed;
        if completed {
            study.session.is_active = false;
            study.session.completed_at = Some(now);
        }

        card.apply(&update, now);
        debug!(
            card_id,
            rating = rating.value(),
            requeued,
            completed,
            "review applied"
        );

        let outcome = ReviewOutcome {
            card,
            session: study.session.clone(),
            requeued,
            completed,
        };

        if completed {
            *active = None;
        }

        Ok(outcome)
    }

    /// Build a resume overview from the cards still pending in the queue.
    async fn overview_from_queue(&self, study: &ActiveStudy) -> ReviseResult<StudyOverview> {
        let mut seen = HashSet::new();
        let mut new_cards = Vec::new();
        let mut due_cards = Vec::new();

        for &card_id in study.queue.remaining_ids() {
            if !seen.insert(card_id) {
                continue;
            }
            if let Some(card) = self.store.get_card(card_id, study.session.user_id).await? {
                if card.is_new() {
                    new_cards.push(card);
                } else {
                    due_cards.push(card);
                }
            }
        }

        Ok(StudyOverview {
            session: study.session.clone(),
            total_cards: study.session.cards_total,
            new_cards,
            due_cards,
        })
    }
}
