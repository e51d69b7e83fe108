//! SM-2 variant driven by the 1-4 study buttons.

use chrono::{DateTime, Duration, Utc};

use super::{round_days, ScaleStrategy};
use crate::error::ReviseResult;
use crate::types::{Rating, ScheduleState, ScheduleUpdate, MIN_EASE_FACTOR};

/// Button-driven SM-2, the session study path.
///
/// Again is an unconditional lapse: repetitions and interval reset to zero
/// and the ease factor is left untouched. Successful reviews pick the
/// interval from a per-button table for the first two repetitions, then
/// multiply by the ease factor; the ease update only applies on success.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingScale;

impl RatingScale {
    /// Compute the next schedule for an already-validated rating.
    pub fn next_state(
        &self,
        rating: Rating,
        state: ScheduleState,
        now: DateTime<Utc>,
    ) -> ScheduleUpdate {
        let state = state.normalized();

        if rating.is_lapse() {
            // Again: restart the card. Due immediately.
            return ScheduleUpdate {
                interval: 0,
                ease_factor: state.ease_factor,
                repetitions: 0,
                next_review_at: now,
            };
        }

        let interval = match state.repetitions {
            0 => match rating {
                Rating::Easy => 4,
                _ => 1,
            },
            1 => match rating {
                Rating::Good => 6,
                Rating::Easy => 10,
                _ => 3,
            },
            _ => round_days(f64::from(state.interval) * state.ease()),
        };

        // efDelta = 0.1 - (4 - r) * (0.08 + (4 - r) * 0.02), floor 1.30.
        let r = f64::from(rating.value());
        let delta = 0.1 - (4.0 - r) * (0.08 + (4.0 - r) * 0.02);
        let ease = (f64::from(state.ease_factor) + delta * 100.0).max(f64::from(MIN_EASE_FACTOR));

        ScheduleUpdate {
            interval,
            ease_factor: ease.round() as i32,
            repetitions: state.repetitions + 1,
            next_review_at: now + Duration::days(i64::from(interval)),
        }
    }
}

impl ScaleStrategy for RatingScale {
    fn compute_next_state(
        &self,
        value: i64,
        state: ScheduleState,
        now: DateTime<Utc>,
    ) -> ReviseResult<ScheduleUpdate> {
        let rating = Rating::from_value(value)?;
        Ok(self.next_state(rating, state, now))
    }
}

/// The interval each study button would produce from `state`.
///
/// Returned in button order (Again, Hard, Good, Easy); used to label the
/// buttons before the learner answers.
pub fn preview_intervals(state: ScheduleState, now: DateTime<Utc>) -> [i32; 4] {
    [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy]
        .map(|rating| RatingScale.next_state(rating, state, now).interval)
}
