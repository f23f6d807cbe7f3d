//! Vitality economy: exam outcomes cost vitality, review activity restores it.
//!
//! Every amount here is a non-negative magnitude. The caller applies it as a
//! signed delta and clamps through [`crate::EngagementState`].
//!
//! | section | cost |
//! |---|---|
//! | use of english (cloze) | 2 when wrong |
//! | reading A / B | 5 when wrong |
//! | translation, 0–2 | `round((2 - score) * 2.5)` |
//! | writing A (0–10, pass 6) / B (0–20, pass 12) | 5, plus `round(pass - score)` below pass |
//! | anything else | 3 when wrong |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scheduler::Quality;

const LOW_STAKES_DAMAGE: u32 = 2;
const HIGH_STAKES_DAMAGE: u32 = 5;
const FALLBACK_DAMAGE: u32 = 3;

const SHORT_FORM_MAX: f64 = 2.0;
const SHORT_FORM_RATE: f64 = 2.5;

const LONG_FORM_BASE_COST: u32 = 5;
const LONG_FORM_PENALTY_RATE: f64 = 1.0;

const REVIEW_HEAL: u32 = 1;
const LOOKUP_HEAL: u32 = 2;

/// Exam section an answer belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Section {
    /// Cloze, 20 items at 0.5 points.
    UseOfEnglish,
    /// Traditional reading comprehension.
    ReadingA,
    /// Gapped-text reading comprehension.
    ReadingB,
    /// Long-sentence translation, AI-graded 0–2.
    Translation,
    /// Short writing task, AI-graded 0–10.
    WritingA,
    /// Long writing task, AI-graded 0–20.
    WritingB,
    /// A section name this engine has no rule for.
    Unrecognized(String),
}

impl Section {
    /// Parse a section name. Case-insensitive; `cloze` and `reading` are
    /// accepted as legacy aliases.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "use_of_english" | "cloze" => Section::UseOfEnglish,
            "reading_a" | "reading" => Section::ReadingA,
            "reading_b" => Section::ReadingB,
            "translation" => Section::Translation,
            "writing_a" => Section::WritingA,
            "writing_b" => Section::WritingB,
            _ => Section::Unrecognized(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Section::UseOfEnglish => "use_of_english",
            Section::ReadingA => "reading_a",
            Section::ReadingB => "reading_b",
            Section::Translation => "translation",
            Section::WritingA => "writing_a",
            Section::WritingB => "writing_b",
            Section::Unrecognized(name) => name,
        }
    }

    pub fn rule(&self) -> DamageRule {
        match self {
            Section::UseOfEnglish => DamageRule::Objective {
                wrong: LOW_STAKES_DAMAGE,
            },
            Section::ReadingA | Section::ReadingB => DamageRule::Objective {
                wrong: HIGH_STAKES_DAMAGE,
            },
            Section::Translation => DamageRule::ShortForm,
            Section::WritingA => DamageRule::LongForm {
                max_score: 10.0,
                pass_threshold: 6.0,
            },
            Section::WritingB => DamageRule::LongForm {
                max_score: 20.0,
                pass_threshold: 12.0,
            },
            Section::Unrecognized(_) => DamageRule::Fallback,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Section::Unrecognized(_))
    }
}

impl From<&str> for Section {
    fn from(name: &str) -> Self {
        Section::parse(name)
    }
}

impl From<String> for Section {
    fn from(name: String) -> Self {
        Section::parse(&name)
    }
}

impl From<Section> for String {
    fn from(section: Section) -> String {
        section.as_str().to_string()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a section converts a grade into cost.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DamageRule {
    /// Flat loss on a wrong answer.
    Objective { wrong: u32 },
    /// Loss proportional to the shortfall from 2.0.
    ShortForm,
    /// Submission cost plus a shortfall penalty below the pass mark.
    LongForm { max_score: f64, pass_threshold: f64 },
    /// Conservative loss for an unknown section.
    Fallback,
}

/// The grade an answer received.
///
/// Objective sections read correctness, free-response sections read the score.
/// A `Correct`/`Wrong` grade on a free-response section counts as full marks
/// or zero; a `Scored` grade on an objective section counts as correct when
/// positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Correct,
    Wrong,
    Scored(f64),
}

impl Grade {
    pub fn objective(correct: bool) -> Self {
        if correct { Grade::Correct } else { Grade::Wrong }
    }

    fn is_correct(self) -> bool {
        match self {
            Grade::Correct => true,
            Grade::Wrong => false,
            Grade::Scored(score) => score > 0.0,
        }
    }

    fn score_out_of(self, max_score: f64) -> f64 {
        let raw = match self {
            Grade::Correct => max_score,
            Grade::Wrong => 0.0,
            Grade::Scored(score) if score.is_nan() => 0.0,
            Grade::Scored(score) => score,
        };
        raw.clamp(0.0, max_score)
    }
}

/// Vitality cost of one graded answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Damage {
    /// Flat part of the cost (the whole cost for objective sections).
    pub base: u32,
    /// Below-pass surcharge on long free-response sections.
    pub penalty: u32,
    /// Set when the section had no rule and the fallback applied.
    pub fallback: bool,
}

impl Damage {
    pub fn total(&self) -> u32 {
        self.base + self.penalty
    }

    /// The cost as a signed vitality change.
    pub fn delta(&self) -> i64 {
        -i64::from(self.total())
    }

    fn flat(amount: u32) -> Self {
        Self {
            base: amount,
            ..Self::default()
        }
    }
}

/// Cost of answering a question in `section` with `grade`.
pub fn damage(section: &Section, grade: Grade) -> Damage {
    match section.rule() {
        DamageRule::Objective { wrong } => {
            if grade.is_correct() {
                Damage::default()
            } else {
                Damage::flat(wrong)
            }
        }
        DamageRule::ShortForm => {
            let score = grade.score_out_of(SHORT_FORM_MAX);
            Damage::flat(round_non_negative((SHORT_FORM_MAX - score) * SHORT_FORM_RATE))
        }
        DamageRule::LongForm {
            max_score,
            pass_threshold,
        } => {
            let score = grade.score_out_of(max_score);
            let penalty = if score < pass_threshold {
                round_non_negative((pass_threshold - score) * LONG_FORM_PENALTY_RATE)
            } else {
                0
            };
            Damage {
                base: LONG_FORM_BASE_COST,
                penalty,
                fallback: false,
            }
        }
        DamageRule::Fallback => {
            let base = if grade.is_correct() { 0 } else { FALLBACK_DAMAGE };
            Damage {
                base,
                penalty: 0,
                fallback: true,
            }
        }
    }
}

/// Whether an answer counts as passed in the learner's recent history.
///
/// Long free-response sections pass at their pass mark; every other section
/// passes when the answer cost nothing.
pub fn passed(section: &Section, grade: Grade) -> bool {
    match section.rule() {
        DamageRule::LongForm {
            max_score,
            pass_threshold,
        } => grade.score_out_of(max_score) >= pass_threshold,
        _ => damage(section, grade).total() == 0,
    }
}

fn round_non_negative(x: f64) -> u32 {
    x.round().max(0.0) as u32
}

/// Activity that restores vitality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealSource {
    /// A completed vocabulary review.
    Review(Quality),
    /// An on-demand glossary lookup during context assembly.
    GlossaryLookup,
}

/// Vitality restored by `source`.
pub fn heal(source: HealSource) -> u32 {
    match source {
        HealSource::Review(quality) if quality.heals() => REVIEW_HEAL,
        HealSource::Review(_) => 0,
        HealSource::GlossaryLookup => LOOKUP_HEAL,
    }
}
