//! SQLite-backed card store.
//!
//! Persists decks, cards, study sessions, and the append-only review log.
//! The unique-active-session invariant is enforced here with a partial
//! unique index so that concurrent session creation across processes cannot
//! double-count progress.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, ToSql};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{ReviseError, ReviseResult};
use crate::traits::{CardStore, ReviewTransaction};
use crate::types::{
    Card, Deck, Scope, ScheduleState, ScheduleUpdate, StudySession, DEFAULT_EASE_FACTOR,
};

/// SQLite-backed store for cards, decks, sessions, and review events.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create a new store with the given database path.
    ///
    /// Creates the database file and schema if it doesn't exist.
    pub fn new<P: AsRef<Path>>(path: P) -> ReviseResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> ReviseResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> ReviseResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS decks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                parent_deck_id INTEGER REFERENCES decks(id),
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_decks_user ON decks(user_id);
            CREATE INDEX IF NOT EXISTS idx_decks_parent ON decks(parent_deck_id);

            CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                deck_id INTEGER NOT NULL REFERENCES decks(id),
                front TEXT NOT NULL,
                back TEXT NOT NULL,
                interval INTEGER NOT NULL DEFAULT 0,
                ease_factor INTEGER NOT NULL DEFAULT 250,
                repetitions INTEGER NOT NULL DEFAULT 0,
                next_review_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id);
            CREATE INDEX IF NOT EXISTS idx_cards_due ON cards(user_id, repetitions, next_review_at);

            CREATE TABLE IF NOT EXISTS study_sessions (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                deck_id INTEGER NOT NULL,
                cards_total INTEGER NOT NULL,
                cards_reviewed INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                started_at TEXT NOT NULL,
                completed_at TEXT
            );

            -- One active session per (user, deck) scope.
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_active
                ON study_sessions(user_id, deck_id) WHERE is_active = 1;

            CREATE TABLE IF NOT EXISTS card_reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                card_id INTEGER NOT NULL REFERENCES cards(id),
                user_id INTEGER NOT NULL,
                session_id TEXT,
                rating INTEGER NOT NULL,
                time_taken_ms INTEGER,
                reviewed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reviews_card ON card_reviews(card_id);
            CREATE INDEX IF NOT EXISTS idx_reviews_session ON card_reviews(session_id);
            ",
        )?;

        Ok(())
    }

    fn lock(&self) -> ReviseResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ReviseError::storage(e.to_string()))
    }

    fn row_to_card(row: &Row<'_>) -> rusqlite::Result<Card> {
        Ok(Card {
            id: row.get(0)?,
            user_id: row.get(1)?,
            deck_id: row.get(2)?,
            front: row.get(3)?,
            back: row.get(4)?,
            state: ScheduleState {
                interval: row.get(5)?,
                ease_factor: row.get(6)?,
                repetitions: row.get(7)?,
            },
            next_review_at: parse_ts(&row.get::<_, String>(8)?)?,
            created_at: parse_ts(&row.get::<_, String>(9)?)?,
            updated_at: parse_ts(&row.get::<_, String>(10)?)?,
        })
    }

    fn row_to_session(row: &Row<'_>) -> rusqlite::Result<StudySession> {
        let id: String = row.get(0)?;
        let completed_at: Option<String> = row.get(7)?;
        Ok(StudySession {
            id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
            user_id: row.get(1)?,
            deck_id: row.get(2)?,
            cards_total: row.get(3)?,
            cards_reviewed: row.get(4)?,
            is_active: row.get::<_, i64>(5)? != 0,
            started_at: parse_ts(&row.get::<_, String>(6)?)?,
            completed_at: completed_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

const CARD_COLUMNS: &str = "id, user_id, deck_id, front, back, interval, ease_factor, \
                            repetitions, next_review_at, created_at, updated_at";

const SESSION_COLUMNS: &str = "id, user_id, deck_id, cards_total, cards_reviewed, \
                               is_active, started_at, completed_at";

fn parse_ts(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn placeholders(count: usize) -> String {
    std::iter::repeat("?")
        .take(count)
        .collect::<Vec<_>>()
        .join(", ")
}

fn update_card_sql(tx: &rusqlite::Transaction<'_>, card_id: i64, user_id: i64, update: &ScheduleUpdate, now: DateTime<Utc>) -> ReviseResult<()> {
    let changed = tx.execute(
        "UPDATE cards
         SET interval = ?1, ease_factor = ?2, repetitions = ?3,
             next_review_at = ?4, updated_at = ?5
         WHERE id = ?6 AND user_id = ?7",
        params![
            update.interval,
            update.ease_factor,
            update.repetitions,
            update.next_review_at.to_rfc3339(),
            now.to_rfc3339(),
            card_id,
            user_id,
        ],
    )?;
    if changed == 0 {
        return Err(ReviseError::card_not_found(card_id));
    }
    Ok(())
}

#[async_trait]
impl CardStore for SqliteStore {
    async fn create_deck(
        &self,
        user_id: i64,
        name: String,
        parent_deck_id: Option<i64>,
    ) -> ReviseResult<Deck> {
        let conn = self.lock()?;

        if let Some(parent_id) = parent_deck_id {
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT id FROM decks WHERE id = ?1 AND user_id = ?2",
                    params![parent_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(ReviseError::deck_not_found(parent_id));
            }
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO decks (user_id, parent_deck_id, name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, parent_deck_id, name, now.to_rfc3339()],
        )?;

        Ok(Deck {
            id: conn.last_insert_rowid(),
            user_id,
            parent_deck_id,
            name,
        })
    }

    async fn decks_for_user(&self, user_id: i64) -> ReviseResult<Vec<Deck>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, user_id, parent_deck_id, name FROM decks WHERE user_id = ?1")?;
        let decks = stmt
            .query_map(params![user_id], |row| {
                Ok(Deck {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    parent_deck_id: row.get(2)?,
                    name: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(decks)
    }

    async fn create_card(
        &self,
        user_id: i64,
        deck_id: i64,
        front: String,
        back: String,
    ) -> ReviseResult<Card> {
        let conn = self.lock()?;

        let deck_exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM decks WHERE id = ?1 AND user_id = ?2",
                params![deck_id, user_id],
                |row| row.get(0),
            )
            .optional()?;
        if deck_exists.is_none() {
            return Err(ReviseError::deck_not_found(deck_id));
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO cards (user_id, deck_id, front, back, interval, ease_factor,
                                repetitions, next_review_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, 0, ?6, ?6, ?6)",
            params![
                user_id,
                deck_id,
                front,
                back,
                DEFAULT_EASE_FACTOR,
                now.to_rfc3339()
            ],
        )?;

        Ok(Card {
            id: conn.last_insert_rowid(),
            user_id,
            deck_id,
            front,
            back,
            state: ScheduleState::new(),
            next_review_at: now,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_card(&self, card_id: i64, user_id: i64) -> ReviseResult<Option<Card>> {
        let conn = self.lock()?;
        let card = conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1 AND user_id = ?2"),
                params![card_id, user_id],
                Self::row_to_card,
            )
            .optional()?;
        Ok(card)
    }

    async fn new_cards(
        &self,
        user_id: i64,
        deck_ids: Vec<i64>,
        limit: usize,
    ) -> ReviseResult<Vec<Card>> {
        if deck_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;

        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards
             WHERE user_id = ? AND repetitions = 0 AND deck_id IN ({})
             ORDER BY created_at ASC
             LIMIT {limit}",
            placeholders(deck_ids.len()),
        );

        let mut stmt = conn.prepare(&sql)?;
        let params = std::iter::once(user_id).chain(deck_ids);
        let cards = stmt
            .query_map(params_from_iter(params), Self::row_to_card)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    async fn due_cards(
        &self,
        user_id: i64,
        deck_ids: Vec<i64>,
        now: DateTime<Utc>,
        repetition_tiers: Option<Vec<u32>>,
        limit: usize,
    ) -> ReviseResult<Vec<Card>> {
        if deck_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;

        let tier_clause = match &repetition_tiers {
            Some(tiers) if !tiers.is_empty() => {
                format!("AND repetitions IN ({})", placeholders(tiers.len()))
            }
            _ => String::new(),
        };

        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards
             WHERE user_id = ? AND repetitions > 0 AND next_review_at <= ?
               AND deck_id IN ({}) {tier_clause}
             ORDER BY next_review_at ASC
             LIMIT {limit}",
            placeholders(deck_ids.len()),
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        params.push(Box::new(user_id));
        params.push(Box::new(now.to_rfc3339()));
        for deck_id in &deck_ids {
            params.push(Box::new(*deck_id));
        }
        if let Some(tiers) = &repetition_tiers {
            for tier in tiers {
                params.push(Box::new(*tier));
            }
        }
        let cards = stmt
            .query_map(
                params_from_iter(params.iter().map(Box::as_ref)),
                Self::row_to_card,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    async fn apply_review(&self, review: ReviewTransaction) -> ReviseResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        update_card_sql(
            &tx,
            review.card_id,
            review.user_id,
            &review.update,
            review.event.reviewed_at,
        )?;

        tx.execute(
            "INSERT INTO card_reviews (card_id, user_id, session_id, rating,
                                       time_taken_ms, reviewed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                review.event.card_id,
                review.event.user_id,
                review.event.session_id.map(|id| id.to_string()),
                review.event.rating,
                review.event.time_taken_ms,
                review.event.reviewed_at.to_rfc3339(),
            ],
        )?;

        if let Some(progress) = review.progress {
            let changed = tx.execute(
                "UPDATE study_sessions
                 SET cards_reviewed = ?1, is_active = ?2, completed_at = ?3
                 WHERE id = ?4",
                params![
                    progress.cards_reviewed,
                    progress.is_active as i64,
                    progress.completed_at.map(|t| t.to_rfc3339()),
                    progress.session_id.to_string(),
                ],
            )?;
            if changed == 0 {
                return Err(ReviseError::session_not_found(format!(
                    "Session '{}' not found",
                    progress.session_id
                )));
            }
        }

        tx.commit()?;
        Ok(())
    }

    async fn active_session(&self, scope: Scope) -> ReviseResult<Option<StudySession>> {
        let conn = self.lock()?;
        let session = conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM study_sessions
                     WHERE user_id = ?1 AND deck_id = ?2 AND is_active = 1"
                ),
                params![scope.user_id, scope.deck_id],
                Self::row_to_session,
            )
            .optional()?;
        Ok(session)
    }

    async fn insert_session(&self, session: &StudySession) -> ReviseResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO study_sessions (id, user_id, deck_id, cards_total,
                                         cards_reviewed, is_active, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.id.to_string(),
                session.user_id,
                session.deck_id,
                session.cards_total,
                session.cards_reviewed,
                session.is_active as i64,
                session.started_at.to_rfc3339(),
                session.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    async fn close_session(
        &self,
        session_id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> ReviseResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE study_sessions SET is_active = 0, completed_at = ?1 WHERE id = ?2",
            params![
                completed_at.map(|t| t.to_rfc3339()),
                session_id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(ReviseError::session_not_found(format!(
                "Session '{}' not found",
                session_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReviewEvent;
    use chrono::Duration;

    async fn seeded_store() -> (SqliteStore, Deck, Card) {
        let store = SqliteStore::in_memory().unwrap();
        let deck = store.create_deck(1, "Biology".into(), None).await.unwrap();
        let card = store
            .create_card(1, deck.id, "Mitochondria?".into(), "Powerhouse".into())
            .await
            .unwrap();
        (store, deck, card)
    }

    #[tokio::test]
    async fn test_create_and_get_card() {
        let (store, _deck, card) = seeded_store().await;

        let fetched = store.get_card(card.id, 1).await.unwrap().unwrap();
        assert_eq!(fetched.front, "Mitochondria?");
        assert_eq!(fetched.state, ScheduleState::new());

        // Wrong owner sees nothing.
        assert!(store.get_card(card.id, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_card_requires_deck() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store
            .create_card(1, 999, "a".into(), "b".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ReviseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_new_and_due_queries() {
        let (store, deck, card) = seeded_store().await;
        let now = Utc::now();

        let fresh = store.new_cards(1, vec![deck.id], 20).await.unwrap();
        assert_eq!(fresh.len(), 1);

        // Not due yet: repetitions == 0.
        let due = store
            .due_cards(1, vec![deck.id], now, None, 50)
            .await
            .unwrap();
        assert!(due.is_empty());

        // Promote it to a due card.
        let update = ScheduleUpdate {
            interval: 1,
            ease_factor: 250,
            repetitions: 1,
            next_review_at: now - Duration::hours(1),
        };
        store
            .apply_review(ReviewTransaction {
                card_id: card.id,
                user_id: 1,
                update,
                event: ReviewEvent {
                    card_id: card.id,
                    user_id: 1,
                    session_id: None,
                    rating: 3,
                    time_taken_ms: None,
                    reviewed_at: now,
                },
                progress: None,
            })
            .await
            .unwrap();

        let fresh = store.new_cards(1, vec![deck.id], 20).await.unwrap();
        assert!(fresh.is_empty());

        let due = store
            .due_cards(1, vec![deck.id], now, None, 50)
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].state.repetitions, 1);

        // Tier filter excludes repetition 1 when asked, and matches it
        // when the tier is listed.
        let due = store
            .due_cards(1, vec![deck.id], now, Some(vec![2, 3]), 50)
            .await
            .unwrap();
        assert!(due.is_empty());

        let due = store
            .due_cards(1, vec![deck.id], now, Some(vec![1, 2, 3]), 50)
            .await
            .unwrap();
        assert_eq!(due.len(), 1);

        // Wrong owner sees nothing through the same query.
        let due = store
            .due_cards(2, vec![deck.id], now, None, 50)
            .await
            .unwrap();
        assert!(due.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_surfaces_as_storage_error() {
        let (store, _deck, card) = seeded_store().await;

        {
            let conn = store.lock().unwrap();
            conn.execute(
                "UPDATE cards SET next_review_at = 'yesterday-ish' WHERE id = ?1",
                params![card.id],
            )
            .unwrap();
        }

        let err = store.get_card(card.id, 1).await.unwrap_err();
        assert!(matches!(err, ReviseError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_only_one_active_session_per_scope() {
        let (store, deck, _card) = seeded_store().await;
        let scope = Scope::new(1, deck.id);
        let now = Utc::now();

        let first = StudySession::start(scope, 3, now);
        store.insert_session(&first).await.unwrap();
        assert!(store
            .insert_session(&StudySession::start(scope, 3, now))
            .await
            .is_err());

        store.close_session(first.id, Some(now)).await.unwrap();
        store
            .insert_session(&StudySession::start(scope, 3, now))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_apply_review_rolls_back_on_missing_session() {
        let (store, _deck, card) = seeded_store().await;
        let now = Utc::now();

        let err = store
            .apply_review(ReviewTransaction {
                card_id: card.id,
                user_id: 1,
                update: ScheduleUpdate {
                    interval: 1,
                    ease_factor: 250,
                    repetitions: 1,
                    next_review_at: now + Duration::days(1),
                },
                event: ReviewEvent {
                    card_id: card.id,
                    user_id: 1,
                    session_id: None,
                    rating: 3,
                    time_taken_ms: Some(1200),
                    reviewed_at: now,
                },
                progress: Some(crate::traits::SessionProgress {
                    session_id: Uuid::new_v4(),
                    cards_reviewed: 1,
                    is_active: true,
                    completed_at: None,
                }),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ReviseError::NotFound { .. }));

        // The card update must not have been committed.
        let card = store.get_card(card.id, 1).await.unwrap().unwrap();
        assert_eq!(card.state.repetitions, 0);
    }
}
