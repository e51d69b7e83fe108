//! SM-2 variant driven by the 0-5 quality scale.

use chrono::{DateTime, Duration, Utc};

use super::{round_days, ScaleStrategy};
use crate::error::ReviseResult;
use crate::types::{Quality, ScheduleState, ScheduleUpdate, MIN_EASE_FACTOR};

/// Quality-driven SM-2, the standalone review path.
///
/// Success iff quality >= 3. A lapse resets repetitions and schedules the
/// card one day out. Unlike [`super::RatingScale`], the ease update applies
/// on every review, lapses included, so repeated low-quality reviews drive
/// the ease factor down toward the floor.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityScale;

impl QualityScale {
    /// Compute the next schedule for an already-validated quality.
    pub fn next_state(
        &self,
        quality: Quality,
        state: ScheduleState,
        now: DateTime<Utc>,
    ) -> ScheduleUpdate {
        let state = state.normalized();

        let (interval, repetitions) = if quality.is_success() {
            let interval = match state.repetitions {
                0 => 1,
                1 => 6,
                _ => round_days(f64::from(state.interval) * state.ease()),
            };
            (interval, state.repetitions + 1)
        } else {
            // Lapse: repetitions reset, card comes back in one day.
            (1, 0)
        };

        // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floor 1.30.
        let q = f64::from(quality.value());
        let delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
        let ease = (f64::from(state.ease_factor) + delta * 100.0).max(f64::from(MIN_EASE_FACTOR));

        ScheduleUpdate {
            interval,
            ease_factor: ease.round() as i32,
            repetitions,
            next_review_at: now + Duration::days(i64::from(interval)),
        }
    }
}

impl ScaleStrategy for QualityScale {
    fn compute_next_state(
        &self,
        value: i64,
        state: ScheduleState,
        now: DateTime<Utc>,
    ) -> ReviseResult<ScheduleUpdate> {
        let quality = Quality::from_value(value)?;
        Ok(self.next_state(quality, state, now))
    }
}
