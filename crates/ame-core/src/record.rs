use serde::{Deserialize, Serialize};

use crate::constants::EF_DEFAULT;
use crate::scheduler::{Quality, Schedule};

/// Normalize a vocabulary item to its persisted key form.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// The three fields the SM-2 update reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulingState {
    pub repetition_count: u32,
    pub easiness_factor: f64,
    pub interval_days: u32,
}

impl Default for SchedulingState {
    fn default() -> Self {
        Self {
            repetition_count: 0,
            easiness_factor: EF_DEFAULT,
            interval_days: 0,
        }
    }
}

/// Per-learner, per-item spaced-repetition state.
///
/// Created with defaults on the first review of an unseen item and only ever
/// mutated through [`MasteryRecord::record_review`]. Never deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub item_key: String,
    pub repetition_count: u32,
    pub easiness_factor: f64,
    pub interval_days: u32,
    /// Unix seconds; `None` until first scheduled.
    pub next_due: Option<i64>,
    /// Unix seconds; `None` until first reviewed.
    pub last_reviewed: Option<i64>,
    pub mistake_count: u32,
    pub consecutive_correct: u32,
    pub total_reviews: u32,
    pub correct_reviews: u32,
}

impl MasteryRecord {
    pub fn new(item_key: &str) -> Self {
        Self {
            item_key: normalize_key(item_key),
            repetition_count: 0,
            easiness_factor: EF_DEFAULT,
            interval_days: 0,
            next_due: None,
            last_reviewed: None,
            mistake_count: 0,
            consecutive_correct: 0,
            total_reviews: 0,
            correct_reviews: 0,
        }
    }

    pub fn scheduling_state(&self) -> SchedulingState {
        SchedulingState {
            repetition_count: self.repetition_count,
            easiness_factor: self.easiness_factor,
            interval_days: self.interval_days,
        }
    }

    /// Write back one scheduled review.
    ///
    /// Scheduling fields are replaced by `schedule`; the counters advance
    /// according to whether `quality` passed.
    pub fn record_review(&mut self, quality: Quality, schedule: &Schedule, reviewed_at: i64) {
        self.repetition_count = schedule.repetition_count;
        self.easiness_factor = schedule.easiness_factor;
        self.interval_days = schedule.interval_days;
        self.next_due = Some(schedule.next_due);
        self.last_reviewed = Some(reviewed_at);

        self.total_reviews = self.total_reviews.saturating_add(1);
        if quality.passed() {
            self.correct_reviews = self.correct_reviews.saturating_add(1);
            self.consecutive_correct = self.consecutive_correct.saturating_add(1);
        } else {
            self.mistake_count = self.mistake_count.saturating_add(1);
            self.consecutive_correct = 0;
        }
    }

    /// True once `next_due` has been reached. Never-scheduled items are not due.
    pub fn is_due(&self, now: i64) -> bool {
        self.next_due.is_some_and(|due| due <= now)
    }

    /// Fraction of reviews that passed, 0.0 for an unreviewed item.
    pub fn accuracy(&self) -> f64 {
        if self.total_reviews == 0 {
            0.0
        } else {
            f64::from(self.correct_reviews) / f64::from(self.total_reviews)
        }
    }
}
