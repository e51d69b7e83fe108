//! Card and deck types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default ease factor for a card that has never been reviewed (ease 2.50).
pub const DEFAULT_EASE_FACTOR: i32 = 250;

/// Lower bound for the ease factor (ease 1.30). Enforced after every update.
pub const MIN_EASE_FACTOR: i32 = 130;

/// Persistent scheduling memory for one flashcard.
///
/// These three fields plus `next_review_at` are the entire durable contract
/// between the scheduler and its storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleState {
    /// Days until the next scheduled review; 0 means "new" or "reset".
    pub interval: i32,
    /// Ease multiplier stored as a fixed-point integer ×100 (250 = 2.50).
    pub ease_factor: i32,
    /// Consecutive successful reviews since the last lapse.
    pub repetitions: u32,
}

impl ScheduleState {
    /// State of a card that has never been reviewed.
    pub fn new() -> Self {
        Self {
            interval: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            repetitions: 0,
        }
    }

    /// Map out-of-range stored values back to new-card defaults.
    ///
    /// Negative intervals or sub-floor ease factors in storage are treated
    /// the same as a card that was never reviewed rather than rejected.
    pub fn normalized(self) -> Self {
        Self {
            interval: if self.interval < 0 { 0 } else { self.interval },
            ease_factor: if self.ease_factor < MIN_EASE_FACTOR {
                DEFAULT_EASE_FACTOR
            } else {
                self.ease_factor
            },
            repetitions: self.repetitions,
        }
    }

    /// Real-valued ease multiplier (`ease_factor / 100`).
    pub fn ease(&self) -> f64 {
        f64::from(self.ease_factor) / 100.0
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fully recomputed scheduling output of one review.
///
/// `next_review_at` is always derived from `interval` at update time and is
/// never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    pub interval: i32,
    pub ease_factor: i32,
    pub repetitions: u32,
    pub next_review_at: DateTime<Utc>,
}

impl ScheduleUpdate {
    /// The persistent state portion of this update.
    pub fn state(&self) -> ScheduleState {
        ScheduleState {
            interval: self.interval,
            ease_factor: self.ease_factor,
            repetitions: self.repetitions,
        }
    }
}

/// A flashcard with its scheduling state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub deck_id: i64,
    pub user_id: i64,
    pub front: String,
    pub back: String,
    #[serde(flatten)]
    pub state: ScheduleState,
    /// When the card becomes due.
    pub next_review_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Whether the card has never been successfully reviewed.
    pub fn is_new(&self) -> bool {
        self.state.repetitions == 0
    }

    /// Whether the card is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state.repetitions > 0 && self.next_review_at <= now
    }

    /// Apply a schedule update in memory.
    pub fn apply(&mut self, update: &ScheduleUpdate, now: DateTime<Utc>) {
        self.state = update.state();
        self.next_review_at = update.next_review_at;
        self.updated_at = now;
    }
}

/// A deck in the parent-pointer tree. Each deck has at most one parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: i64,
    pub user_id: i64,
    pub parent_deck_id: Option<i64>,
    pub name: String,
}
