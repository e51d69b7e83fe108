//! SM-2 scheduling strategies.
//!
//! Two near-identical variants of the SM-2 algorithm ship here as distinct
//! named strategies. They encode different product decisions (interval
//! tables, lapse handling, ease-update conditions) and are deliberately not
//! merged:
//!
//! - [`QualityScale`]: driven by a 0-5 quality value, used by the standalone
//!   review path. Success iff quality >= 3; the ease update applies on every
//!   review, lapses included.
//! - [`RatingScale`]: driven by the 1-4 study buttons, used by the session
//!   path. Again (1) is an unconditional lapse that leaves the ease factor
//!   untouched; the first two successful reviews use a per-button interval
//!   table.
//!
//! Both strategies are pure: same inputs, same output, no I/O. All ease
//! arithmetic happens in f64 and rounds half-away-from-zero (`f64::round`);
//! with the positive operands in play this is round-half-up, and tests pin
//! it since the choice is observable as long-run ease drift.

mod quality;
mod rating;

pub use quality::QualityScale;
pub use rating::{preview_intervals, RatingScale};

use chrono::{DateTime, Utc};

use crate::error::ReviseResult;
use crate::types::{ScheduleState, ScheduleUpdate};

/// A scheduling strategy for one input scale.
///
/// `value` is the raw caller-supplied rating; each strategy validates its
/// own accepted range and rejects anything outside it without mutating
/// state. Negative or out-of-range fields in `state` are normalized to
/// new-card defaults, matching how an unreviewed card is stored.
pub trait ScaleStrategy: Send + Sync {
    fn compute_next_state(
        &self,
        value: i64,
        state: ScheduleState,
        now: DateTime<Utc>,
    ) -> ReviseResult<ScheduleUpdate>;
}

/// Round to the nearest whole day, halves away from zero.
pub(crate) fn round_days(days: f64) -> i32 {
    days.round() as i32
}
