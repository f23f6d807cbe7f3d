//! Adaptive mastery engine.
//!
//! Spaced-repetition scheduling (SM-2), a bounded vitality economy driven by
//! exam outcomes and review activity, mood classification from vitality, and
//! resonance scanning of free text against a learner's studied vocabulary.
//!
//! Zero I/O. Record storage, dictionary glosses and the clock are reached
//! through the [`MasteryLookup`], [`GlossaryLookup`] and [`Clock`] traits.

pub mod backup;
pub mod constants;
pub mod economy;
pub mod engagement;
pub mod error;
pub mod mood;
pub mod progress;
pub mod record;
pub mod resonance;
pub mod scheduler;
pub mod time;
pub mod tokenizer;

pub use backup::{BACKUP_VERSION, ProgressBackup, export_json, import_json};
pub use constants::{DEFAULT_VITALITY_CEILING, EF_DEFAULT, EF_MIN};
pub use economy::{Damage, DamageRule, Grade, HealSource, Section, damage, heal, passed};
pub use engagement::EngagementState;
pub use error::{EngineError, Result};
pub use mood::{Mood, MoodReading, classify};
pub use progress::{
    ExamOutcome, LearnerSnapshot, ProgressStats, RECENT_EXAM_WINDOW, due_queue, progress_stats,
    recent_accuracy,
};
pub use record::{MasteryRecord, SchedulingState, normalize_key};
pub use resonance::{
    GlossaryLookup, MasteryLookup, NoGlossary, ResonanceHit, ResonanceScanner, ScanOptions, Tier,
    classify_tier,
};
pub use scheduler::{Quality, ReviewScheduler, Schedule, schedule};
pub use time::{Clock, FixedClock, SystemClock};
pub use tokenizer::{candidate_keys, tokenize};
