//! JSON backup format for one learner's progress.
//!
//! The wire format uses camelCase field names and ISO-8601 UTC timestamps.
//! Import is lenient: unparsable timestamps read as unset, easiness factors
//! below the floor are raised to it, and keys are re-normalized.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_VITALITY_CEILING, EF_DEFAULT, EF_MIN};
use crate::engagement::EngagementState;
use crate::record::{MasteryRecord, normalize_key};
use crate::time::{iso8601_to_unix, unix_to_iso8601};

pub const BACKUP_VERSION: &str = "1";

#[derive(Serialize, Deserialize, Debug)]
pub struct WireBackup {
    pub version: String,
    #[serde(rename = "exportedAt", default)]
    pub exported_at: String,
    #[serde(default)]
    pub learner: String,
    #[serde(default)]
    pub engagement: WireEngagement,
    #[serde(default)]
    pub records: Vec<WireRecord>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WireEngagement {
    pub vitality: i64,
    #[serde(rename = "vitalityCeiling")]
    pub vitality_ceiling: i64,
}

impl Default for WireEngagement {
    fn default() -> Self {
        Self {
            vitality: DEFAULT_VITALITY_CEILING,
            vitality_ceiling: DEFAULT_VITALITY_CEILING,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WireRecord {
    /// Accepts the older `word` field name.
    #[serde(rename = "itemKey", alias = "word")]
    pub item_key: String,
    #[serde(rename = "repetitionCount", alias = "repetition", default)]
    pub repetition_count: u32,
    #[serde(rename = "easinessFactor", default = "default_ef")]
    pub easiness_factor: f64,
    #[serde(rename = "intervalDays", alias = "interval", default)]
    pub interval_days: u32,
    #[serde(rename = "nextDue", alias = "nextReview", default)]
    pub next_due: Option<String>,
    #[serde(rename = "lastReviewed", alias = "lastReview", default)]
    pub last_reviewed: Option<String>,
    #[serde(rename = "mistakeCount", default)]
    pub mistake_count: u32,
    #[serde(rename = "consecutiveCorrect", default)]
    pub consecutive_correct: u32,
    #[serde(rename = "totalReviews", default)]
    pub total_reviews: u32,
    #[serde(rename = "correctReviews", default)]
    pub correct_reviews: u32,
}

fn default_ef() -> f64 {
    EF_DEFAULT
}

/// A decoded backup.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBackup {
    pub learner: String,
    pub engagement: EngagementState,
    pub records: Vec<MasteryRecord>,
}

impl From<&MasteryRecord> for WireRecord {
    fn from(r: &MasteryRecord) -> Self {
        WireRecord {
            item_key: r.item_key.clone(),
            repetition_count: r.repetition_count,
            easiness_factor: r.easiness_factor,
            interval_days: r.interval_days,
            next_due: r.next_due.map(unix_to_iso8601),
            last_reviewed: r.last_reviewed.map(unix_to_iso8601),
            mistake_count: r.mistake_count,
            consecutive_correct: r.consecutive_correct,
            total_reviews: r.total_reviews,
            correct_reviews: r.correct_reviews,
        }
    }
}

impl From<WireRecord> for MasteryRecord {
    fn from(w: WireRecord) -> Self {
        let easiness_factor = if w.easiness_factor.is_finite() {
            w.easiness_factor.max(EF_MIN)
        } else {
            EF_DEFAULT
        };
        MasteryRecord {
            item_key: normalize_key(&w.item_key),
            repetition_count: w.repetition_count,
            easiness_factor,
            interval_days: w.interval_days,
            next_due: w.next_due.as_deref().and_then(iso8601_to_unix),
            last_reviewed: w.last_reviewed.as_deref().and_then(iso8601_to_unix),
            mistake_count: w.mistake_count,
            consecutive_correct: w.consecutive_correct,
            total_reviews: w.total_reviews,
            correct_reviews: w.correct_reviews,
        }
    }
}

impl WireBackup {
    pub fn into_backup(self) -> ProgressBackup {
        ProgressBackup {
            learner: self.learner,
            engagement: EngagementState::new(
                self.engagement.vitality,
                self.engagement.vitality_ceiling,
            ),
            records: self
                .records
                .into_iter()
                .map(MasteryRecord::from)
                .filter(|r| !r.item_key.is_empty())
                .collect(),
        }
    }
}

/// Serialize a learner's progress, stamped with `exported_at` (Unix seconds).
pub fn export_json(
    learner: &str,
    engagement: &EngagementState,
    records: &[MasteryRecord],
    exported_at: i64,
) -> Result<String, serde_json::Error> {
    let wire = WireBackup {
        version: BACKUP_VERSION.to_string(),
        exported_at: unix_to_iso8601(exported_at),
        learner: learner.to_string(),
        engagement: WireEngagement {
            vitality: engagement.vitality(),
            vitality_ceiling: engagement.vitality_ceiling(),
        },
        records: records.iter().map(WireRecord::from).collect(),
    };
    serde_json::to_string_pretty(&wire)
}

pub fn import_json(json: &str) -> Result<ProgressBackup, serde_json::Error> {
    let wire: WireBackup = serde_json::from_str(json)?;
    Ok(wire.into_backup())
}
