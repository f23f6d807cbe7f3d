/// Floor for the SM-2 easiness factor.
pub const EF_MIN: f64 = 1.3;

/// Easiness factor assigned to a never-reviewed item.
pub const EF_DEFAULT: f64 = 2.5;

/// Highest recall quality a review can report.
pub const QUALITY_MAX: u8 = 5;

/// Reviews at or above this quality count as a successful repetition.
pub const PASSING_QUALITY: u8 = 3;

/// Reviews at or above this quality restore vitality.
pub const HEALING_QUALITY: u8 = 4;

/// Vitality ceiling for a fresh learner.
pub const DEFAULT_VITALITY_CEILING: i64 = 100;

/// Seconds per scheduling day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Decimal places of easiness factor retained across writes.
pub const EF_PRECISION: i32 = 4;

/// Shortest alphabetic run the resonance tokenizer keeps.
pub const MIN_TOKEN_LEN: usize = 3;

/// Longest gloss excerpt attached to a resonance hit, in characters.
pub const GLOSS_MAX_CHARS: usize = 40;
