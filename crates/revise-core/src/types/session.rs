//! Study session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorCode, ReviseError, ReviseResult};

/// The unit over which a study session is defined: one user studying one
/// deck (and all of its descendant subdecks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub user_id: i64,
    pub deck_id: i64,
}

impl Scope {
    pub fn new(user_id: i64, deck_id: i64) -> Self {
        Self { user_id, deck_id }
    }

    /// Validate that both identifiers are usable.
    pub fn validate(&self) -> ReviseResult<()> {
        if self.user_id <= 0 {
            return Err(ReviseError::validation_field(
                "user_id must be a positive identifier",
                ErrorCode::ValMissingField,
                "user_id",
                self.user_id.to_string(),
            ));
        }
        if self.deck_id <= 0 {
            return Err(ReviseError::validation_field(
                "deck_id must be a positive identifier",
                ErrorCode::ValMissingField,
                "deck_id",
                self.deck_id.to_string(),
            ));
        }
        Ok(())
    }
}

/// Persisted record of one study pass over a scope.
///
/// At most one active session exists per scope; the store enforces this
/// with a partial unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub id: Uuid,
    pub user_id: i64,
    pub deck_id: i64,
    /// Candidate count at session start. Fixed for the session's lifetime.
    pub cards_total: u32,
    /// Mastered (non-requeued) outcomes so far.
    pub cards_reviewed: u32,
    pub is_active: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StudySession {
    /// Create a fresh active session for a scope.
    pub fn start(scope: Scope, cards_total: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: scope.user_id,
            deck_id: scope.deck_id,
            cards_total,
            cards_reviewed: 0,
            is_active: true,
            started_at: now,
            completed_at: None,
        }
    }

    /// Whether an active session should be treated as abandoned at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, staleness: chrono::Duration) -> bool {
        self.is_active && now.signed_duration_since(self.started_at) > staleness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_scope_validate() {
        assert!(Scope::new(1, 2).validate().is_ok());
        assert!(Scope::new(0, 2).validate().is_err());
        assert!(Scope::new(1, -5).validate().is_err());
    }

    #[test]
    fn test_session_start() {
        let now = Utc::now();
        let session = StudySession::start(Scope::new(1, 7), 12, now);
        assert_eq!(session.cards_total, 12);
        assert_eq!(session.cards_reviewed, 0);
        assert!(session.is_active);
        assert!(session.completed_at.is_none());
    }

    #[test]
    fn test_session_staleness() {
        let now = Utc::now();
        let mut session = StudySession::start(Scope::new(1, 7), 5, now - Duration::hours(30));
        assert!(session.is_stale(now, Duration::hours(24)));
        assert!(!session.is_stale(now, Duration::hours(48)));

        session.is_active = false;
        assert!(!session.is_stale(now, Duration::hours(24)));
    }
}
