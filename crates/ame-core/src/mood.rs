//! Mood classification from current vitality.
//!
//! Not a state machine: each call looks only at `vitality / ceiling`, never at
//! history. Rules are evaluated in table order and the first match wins.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Exhausted,
    Distressed,
    Engaged,
    Thriving,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Exhausted => "exhausted",
            Mood::Distressed => "distressed",
            Mood::Engaged => "engaged",
            Mood::Thriving => "thriving",
        }
    }

    /// Practice is locked until the learner recovers.
    pub fn blocks_practice(self) -> bool {
        self == Mood::Exhausted
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified mood and the tone guidance that goes with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MoodReading {
    pub mood: Mood,
    pub guidance: &'static str,
}

struct MoodRule {
    mood: Mood,
    applies: fn(vitality: i64, ratio: f64) -> bool,
    guidance: &'static str,
}

fn depleted(vitality: i64, _ratio: f64) -> bool {
    vitality <= 0
}

fn below_distress_line(_vitality: i64, ratio: f64) -> bool {
    ratio < 0.30
}

fn below_thriving_line(_vitality: i64, ratio: f64) -> bool {
    ratio < 0.80
}

fn always(_vitality: i64, _ratio: f64) -> bool {
    true
}

const MOOD_RULES: [MoodRule; 4] = [
    MoodRule {
        mood: Mood::Exhausted,
        applies: depleted,
        guidance: "Vitality is depleted. Block further practice and insist that the learner rests before continuing.",
    },
    MoodRule {
        mood: Mood::Distressed,
        applies: below_distress_line,
        guidance: "Vitality is running low. Strongly suggest a rest, or a few vocabulary reviews to recover.",
    },
    MoodRule {
        mood: Mood::Engaged,
        applies: below_thriving_line,
        guidance: "Steady progress. Keep a professional, lightly encouraging tone while working through the material.",
    },
    MoodRule {
        mood: Mood::Thriving,
        applies: always,
        guidance: "Excellent form. Respond with warm praise and positive reinforcement.",
    },
];

/// Classify `vitality` against `ceiling`. A non-positive ceiling counts as 1.
pub fn classify(vitality: i64, ceiling: i64) -> MoodReading {
    let ceiling = ceiling.max(1);
    let ratio = vitality as f64 / ceiling as f64;

    let rule = MOOD_RULES
        .iter()
        .find(|rule| (rule.applies)(vitality, ratio))
        .unwrap_or(&MOOD_RULES[MOOD_RULES.len() - 1]);

    MoodReading {
        mood: rule.mood,
        guidance: rule.guidance,
    }
}
