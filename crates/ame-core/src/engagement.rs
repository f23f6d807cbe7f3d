use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_VITALITY_CEILING;
use crate::economy::Damage;
use crate::mood::{MoodReading, classify};

/// A learner's bounded vitality.
///
/// `0 <= vitality <= vitality_ceiling` holds for every value of this type,
/// including deserialized ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEngagement")]
pub struct EngagementState {
    vitality: i64,
    vitality_ceiling: i64,
}

#[derive(Deserialize)]
struct RawEngagement {
    vitality: i64,
    #[serde(default = "default_ceiling")]
    vitality_ceiling: i64,
}

fn default_ceiling() -> i64 {
    DEFAULT_VITALITY_CEILING
}

impl From<RawEngagement> for EngagementState {
    fn from(raw: RawEngagement) -> Self {
        Self::new(raw.vitality, raw.vitality_ceiling)
    }
}

impl Default for EngagementState {
    fn default() -> Self {
        Self::full(DEFAULT_VITALITY_CEILING)
    }
}

impl EngagementState {
    /// Build a state, coercing the ceiling to at least 1 and clamping vitality.
    pub fn new(vitality: i64, vitality_ceiling: i64) -> Self {
        let vitality_ceiling = vitality_ceiling.max(1);
        Self {
            vitality: vitality.clamp(0, vitality_ceiling),
            vitality_ceiling,
        }
    }

    /// A fresh learner at full vitality.
    pub fn full(vitality_ceiling: i64) -> Self {
        Self::new(vitality_ceiling, vitality_ceiling)
    }

    pub fn vitality(&self) -> i64 {
        self.vitality
    }

    pub fn vitality_ceiling(&self) -> i64 {
        self.vitality_ceiling
    }

    /// Apply a signed change and clamp. Returns the change actually applied.
    pub fn apply(&mut self, delta: i64) -> i64 {
        let before = self.vitality;
        self.vitality = before.saturating_add(delta).clamp(0, self.vitality_ceiling);
        self.vitality - before
    }

    pub fn take_damage(&mut self, damage: &Damage) -> i64 {
        self.apply(damage.delta())
    }

    pub fn heal(&mut self, amount: u32) -> i64 {
        self.apply(i64::from(amount))
    }

    /// Vitality as a fraction of the ceiling.
    pub fn ratio(&self) -> f64 {
        self.vitality as f64 / self.vitality_ceiling as f64
    }

    /// Vitality as a percentage, one decimal place.
    pub fn percent(&self) -> f64 {
        (self.ratio() * 1000.0).round() / 10.0
    }

    pub fn is_exhausted(&self) -> bool {
        self.vitality == 0
    }

    pub fn mood(&self) -> MoodReading {
        classify(self.vitality, self.vitality_ceiling)
    }
}
