//! Aggregate views over a learner's records: statistics, the status snapshot
//! shown alongside mood, and the next batch of items to review.

use serde::{Deserialize, Serialize};

use crate::economy::{Grade, Section, damage, passed};
use crate::engagement::EngagementState;
use crate::mood::Mood;
use crate::record::MasteryRecord;
use crate::resonance::{Tier, classify_tier};

/// Exam answers the snapshot's recent accuracy is computed over.
pub const RECENT_EXAM_WINDOW: usize = 5;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProgressStats {
    pub total_items: usize,
    pub total_reviews: u64,
    pub correct_reviews: u64,
    /// `correct_reviews / total_reviews`, 0.0 with no reviews.
    pub accuracy: f64,
    /// Mean interval over items with a non-zero interval.
    pub average_interval_days: f64,
    pub weak_items: usize,
    pub due_items: usize,
    pub learning_items: usize,
    pub mastered_items: usize,
}

pub fn progress_stats(records: &[MasteryRecord], now: i64) -> ProgressStats {
    let mut stats = ProgressStats {
        total_items: records.len(),
        ..ProgressStats::default()
    };

    let mut interval_sum = 0u64;
    let mut interval_count = 0u64;

    for r in records {
        stats.total_reviews += u64::from(r.total_reviews);
        stats.correct_reviews += u64::from(r.correct_reviews);
        if r.interval_days > 0 {
            interval_sum += u64::from(r.interval_days);
            interval_count += 1;
        }
        match classify_tier(r, now) {
            Tier::Weak => stats.weak_items += 1,
            Tier::Due => stats.due_items += 1,
            Tier::Learning => stats.learning_items += 1,
            Tier::Mastered => stats.mastered_items += 1,
        }
    }

    if stats.total_reviews > 0 {
        stats.accuracy = stats.correct_reviews as f64 / stats.total_reviews as f64;
    }
    if interval_count > 0 {
        stats.average_interval_days = interval_sum as f64 / interval_count as f64;
    }
    stats
}

/// One graded exam answer, as kept in the learner's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExamOutcome {
    pub section: Section,
    pub grade: Grade,
    pub passed: bool,
    /// Vitality cost charged for the answer, before clamping.
    pub damage: u32,
    pub answered_at: i64,
}

impl ExamOutcome {
    pub fn new(section: &Section, grade: Grade, answered_at: i64) -> Self {
        Self {
            section: section.clone(),
            grade,
            passed: passed(section, grade),
            damage: damage(section, grade).total(),
            answered_at,
        }
    }
}

/// Share of passed answers in `history`, rounded to two decimals.
/// 1.0 with no history.
pub fn recent_accuracy(history: &[ExamOutcome]) -> f64 {
    if history.is_empty() {
        return 1.0;
    }
    let passed = history.iter().filter(|o| o.passed).count();
    (passed as f64 / history.len() as f64 * 100.0).round() / 100.0
}

/// What a context-assembly caller renders about the learner right now.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LearnerSnapshot {
    pub vitality: i64,
    pub vitality_ceiling: i64,
    pub vitality_percent: f64,
    pub mood: Mood,
    pub guidance: &'static str,
    pub total_learned: usize,
    pub weak_count: usize,
    pub recent_accuracy: f64,
    /// Newest first, at most [`RECENT_EXAM_WINDOW`].
    pub recent_history: Vec<ExamOutcome>,
}

impl LearnerSnapshot {
    /// `recent` is the learner's exam history, newest first.
    pub fn new(engagement: &EngagementState, stats: &ProgressStats, recent: &[ExamOutcome]) -> Self {
        let reading = engagement.mood();
        let recent = &recent[..recent.len().min(RECENT_EXAM_WINDOW)];
        Self {
            vitality: engagement.vitality(),
            vitality_ceiling: engagement.vitality_ceiling(),
            vitality_percent: engagement.percent(),
            mood: reading.mood,
            guidance: reading.guidance,
            total_learned: stats.total_items,
            weak_count: stats.weak_items,
            recent_accuracy: recent_accuracy(recent),
            recent_history: recent.to_vec(),
        }
    }
}

/// Items to review next: everything due by `now` plus never-scheduled items,
/// earliest due first, never-scheduled last, at most `limit`.
pub fn due_queue(records: &[MasteryRecord], now: i64, limit: usize) -> Vec<&MasteryRecord> {
    let mut queue: Vec<&MasteryRecord> = records
        .iter()
        .filter(|r| r.next_due.is_none_or(|due| due <= now))
        .collect();
    queue.sort_by_key(|r| r.next_due.unwrap_or(i64::MAX));
    queue.truncate(limit);
    queue
}
