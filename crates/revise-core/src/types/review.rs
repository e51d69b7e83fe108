//! Recall-quality input types and the review event record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::error::{ErrorCode, ReviseError, ReviseResult};

/// Four-point recall rating used by the session study buttons.
///
/// - Again (1): failed recall, the card restarts
/// - Hard (2): recalled with difficulty
/// - Good (3): normal recall
/// - Easy (4): effortless recall
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[repr(u8)]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    /// Numeric value 1-4.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Parse a caller-supplied rating. Out-of-range values are rejected,
    /// never clamped.
    pub fn from_value(value: i64) -> ReviseResult<Self> {
        match value {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            other => Err(ReviseError::validation_field(
                "rating must be between 1 (Again) and 4 (Easy)",
                ErrorCode::ValRatingOutOfRange,
                "rating",
                other.to_string(),
            )),
        }
    }

    /// Whether this rating counts as a lapse on the 4-point scale.
    ///
    /// Only Again is a lapse here; Hard still advances the card (but is
    /// re-queued within a session as weak recall).
    pub fn is_lapse(self) -> bool {
        self == Rating::Again
    }

    /// Whether a session should show this card again before it ends.
    pub fn is_weak(self) -> bool {
        self < Rating::Good
    }
}

/// Six-point SM-2 quality used by the standalone review path.
///
/// 0-2 are failed recall in increasing order of "almost had it"; 3-5 are
/// successful recall in increasing order of confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(u8);

impl Quality {
    /// Parse a caller-supplied quality. Out-of-range values are rejected,
    /// never clamped.
    pub fn from_value(value: i64) -> ReviseResult<Self> {
        match value {
            0..=5 => Ok(Quality(value as u8)),
            other => Err(ReviseError::validation_field(
                "quality must be between 0 and 5",
                ErrorCode::ValQualityOutOfRange,
                "quality",
                other.to_string(),
            )),
        }
    }

    /// Numeric value 0-5.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Success iff quality >= 3.
    pub fn is_success(self) -> bool {
        self.0 >= 3
    }
}

/// Append-only record of one submitted rating.
///
/// Written after every scheduler call; used for analytics only and never
/// read back by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub card_id: i64,
    pub user_id: i64,
    /// Session the review belonged to, if it came through the session path.
    pub session_id: Option<Uuid>,
    /// Raw rating or quality value as submitted.
    pub rating: u8,
    pub time_taken_ms: Option<i64>,
    pub reviewed_at: DateTime<Utc>,
}
