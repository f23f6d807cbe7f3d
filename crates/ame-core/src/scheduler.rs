//! SuperMemo-2 review scheduling.
//!
//! ```text
//! EF' = max(1.3, EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)))
//! I(1) = 1, I(2) = 6, I(n) = round(I(n-1) * EF')
//! ```
//!
//! A review below quality 3 resets the repetition count and interval.

use serde::{Deserialize, Serialize};

use crate::constants::{EF_MIN, EF_PRECISION, HEALING_QUALITY, PASSING_QUALITY, QUALITY_MAX};
use crate::record::{MasteryRecord, SchedulingState};
use crate::time::{Clock, add_days};

/// Self-assessed recall rating, always within `0..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Clamp any integer rating into `0..=5`.
    pub fn new(raw: i64) -> Self {
        Self(raw.clamp(0, i64::from(QUALITY_MAX)) as u8)
    }

    /// Map a graded flashcard answer to a rating.
    ///
    /// Wrong answers rate 1. Correct answers rate 5 when the learner marked
    /// them easy, 3 when marked hard, 4 without feedback.
    pub fn from_answer(is_correct: bool, felt_easy: Option<bool>) -> Self {
        match (is_correct, felt_easy) {
            (false, _) => Self(1),
            (true, Some(true)) => Self(5),
            (true, Some(false)) => Self(3),
            (true, None) => Self(4),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Counts as a successful repetition.
    pub fn passed(self) -> bool {
        self.0 >= PASSING_QUALITY
    }

    /// Earns the review heal.
    pub fn heals(self) -> bool {
        self.0 >= HEALING_QUALITY
    }
}

impl From<i64> for Quality {
    fn from(raw: i64) -> Self {
        Self::new(raw)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> u8 {
        q.0
    }
}

/// Output of one scheduling step. The caller persists it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub repetition_count: u32,
    pub easiness_factor: f64,
    pub interval_days: u32,
    /// Unix seconds.
    pub next_due: i64,
}

impl Schedule {
    pub fn scheduling_state(&self) -> SchedulingState {
        SchedulingState {
            repetition_count: self.repetition_count,
            easiness_factor: self.easiness_factor,
            interval_days: self.interval_days,
        }
    }
}

/// Compute the next schedule for an item reviewed at `now`.
pub fn schedule(quality: Quality, prior: SchedulingState, now: i64) -> Schedule {
    let easiness_factor = next_easiness(quality, prior.easiness_factor);

    let (repetition_count, interval_days) = if quality.passed() {
        let reps = prior.repetition_count.saturating_add(1);
        let interval = match reps {
            1 => 1,
            2 => 6,
            _ => (f64::from(prior.interval_days) * easiness_factor).round() as u32,
        };
        (reps, interval)
    } else {
        (0, 0)
    };

    Schedule {
        repetition_count,
        easiness_factor,
        interval_days,
        next_due: add_days(now, interval_days),
    }
}

/// Updated easiness factor, floored at 1.3 and rounded to 4 decimals.
pub fn next_easiness(quality: Quality, ef: f64) -> f64 {
    let miss = f64::from(QUALITY_MAX - quality.value());
    let raw = ef + (0.1 - miss * (0.08 + miss * 0.02));
    round_ef(raw.max(EF_MIN)).max(EF_MIN)
}

fn round_ef(ef: f64) -> f64 {
    let scale = 10f64.powi(EF_PRECISION);
    (ef * scale).round() / scale
}

/// Scheduler bound to a clock. Holds no learner state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewScheduler<C> {
    clock: C,
}

impl<C: Clock> ReviewScheduler<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn schedule(&self, quality: Quality, prior: SchedulingState) -> Schedule {
        schedule(quality, prior, self.clock.now())
    }

    /// The record as it should be written back after this review.
    pub fn review(&self, record: &MasteryRecord, quality: Quality) -> (MasteryRecord, Schedule) {
        let now = self.clock.now();
        let next = schedule(quality, record.scheduling_state(), now);
        let mut updated = record.clone();
        updated.record_review(quality, &next, now);
        (updated, next)
    }
}
