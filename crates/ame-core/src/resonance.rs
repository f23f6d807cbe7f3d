//! Resonance: find previously studied vocabulary inside new text.
//!
//! A scan tokenizes the passage, fetches the learner's mastery records for
//! every candidate in one batched lookup, tags each hit with a review tier and
//! returns the hits most-urgent first.
//!
//! Scanning never mutates records. A failing store is an error, not an empty
//! result: "nothing to review" and "could not check" must stay distinct.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::GLOSS_MAX_CHARS;
use crate::error::Result;
use crate::record::MasteryRecord;
use crate::time::{Clock, unix_to_iso8601};
use crate::tokenizer::{candidate_keys, suffix_variants};

/// Batched read access to a learner's mastery records.
pub trait MasteryLookup {
    /// Records for whichever of `keys` exist, in any order. Missing keys are
    /// simply absent from the result.
    fn records_for(&self, keys: &[String]) -> Result<Vec<MasteryRecord>>;
}

/// Read-only gloss dictionary.
pub trait GlossaryLookup {
    /// Glosses for whichever of `keys` have one.
    fn glosses_for(&self, keys: &[String]) -> Result<HashMap<String, String>>;
}

impl<T: MasteryLookup + ?Sized> MasteryLookup for &T {
    fn records_for(&self, keys: &[String]) -> Result<Vec<MasteryRecord>> {
        (**self).records_for(keys)
    }
}

impl<T: GlossaryLookup + ?Sized> GlossaryLookup for &T {
    fn glosses_for(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        (**self).glosses_for(keys)
    }
}

impl MasteryLookup for HashMap<String, MasteryRecord> {
    fn records_for(&self, keys: &[String]) -> Result<Vec<MasteryRecord>> {
        Ok(keys.iter().filter_map(|k| self.get(k).cloned()).collect())
    }
}

impl GlossaryLookup for HashMap<String, String> {
    fn glosses_for(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        Ok(keys
            .iter()
            .filter_map(|k| self.get(k).map(|g| (k.clone(), g.clone())))
            .collect())
    }
}

/// A glossary with no entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGlossary;

impl GlossaryLookup for NoGlossary {
    fn glosses_for(&self, _keys: &[String]) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}

/// Review urgency of a hit. Declaration order is output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Repeatedly missed or low easiness.
    Weak,
    /// Scheduled review time has passed.
    Due,
    /// In progress, nothing urgent.
    Learning,
    /// Long streak of successful repetitions.
    Mastered,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Weak => "weak",
            Tier::Due => "due",
            Tier::Learning => "learning",
            Tier::Mastered => "mastered",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct TierRule {
    tier: Tier,
    applies: fn(record: &MasteryRecord, now: i64) -> bool,
}

fn is_weak(r: &MasteryRecord, _now: i64) -> bool {
    r.easiness_factor < 2.0 || r.mistake_count >= 2
}

fn is_mastered(r: &MasteryRecord, _now: i64) -> bool {
    r.repetition_count >= 5 && r.consecutive_correct >= 3
}

fn is_due(r: &MasteryRecord, now: i64) -> bool {
    r.is_due(now)
}

fn is_learning(_r: &MasteryRecord, _now: i64) -> bool {
    true
}

/// First match wins. Note `mastered` is tested before `due`: a mastered item
/// past its due date still reads as mastered.
const TIER_RULES: [TierRule; 4] = [
    TierRule {
        tier: Tier::Weak,
        applies: is_weak,
    },
    TierRule {
        tier: Tier::Mastered,
        applies: is_mastered,
    },
    TierRule {
        tier: Tier::Due,
        applies: is_due,
    },
    TierRule {
        tier: Tier::Learning,
        applies: is_learning,
    },
];

/// Tier for `record` as of `now`.
pub fn classify_tier(record: &MasteryRecord, now: i64) -> Tier {
    TIER_RULES
        .iter()
        .find(|rule| (rule.applies)(record, now))
        .map_or(Tier::Learning, |rule| rule.tier)
}

/// One studied item found in scanned text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResonanceHit {
    pub item_key: String,
    /// The token in the text that led to this record; differs from
    /// `item_key` when a suffix variant matched.
    pub matched: String,
    pub tier: Tier,
    pub rationale: String,
    /// First line of the dictionary gloss, truncated; empty when absent.
    pub gloss: String,
    pub easiness_factor: f64,
    pub repetition_count: u32,
    pub mistake_count: u32,
    pub consecutive_correct: u32,
}

/// Scan behaviour knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    /// Also look up crude `-s`/`-ed`/`-ing` stripped forms.
    pub suffix_variants: bool,
    /// Gloss excerpt length in characters.
    pub gloss_max_chars: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            suffix_variants: true,
            gloss_max_chars: GLOSS_MAX_CHARS,
        }
    }
}

/// Read-only scanner over one learner's records.
pub struct ResonanceScanner<M, G, C> {
    records: M,
    glossary: G,
    clock: C,
    options: ScanOptions,
}

impl<M: MasteryLookup, G: GlossaryLookup, C: Clock> ResonanceScanner<M, G, C> {
    pub fn new(records: M, glossary: G, clock: C) -> Self {
        Self {
            records,
            glossary,
            clock,
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Hits in `text`, ordered weak, due, learning, mastered; ties keep the
    /// order in which the words first appear.
    pub fn scan(&self, text: &str) -> Result<Vec<ResonanceHit>> {
        let candidates = candidate_keys(text);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // lookup key -> index of the candidate that first produced it
        let mut origin: HashMap<String, usize> = HashMap::new();
        let mut lookup_keys = Vec::with_capacity(candidates.len());
        for (idx, candidate) in candidates.iter().enumerate() {
            if !origin.contains_key(candidate) {
                origin.insert(candidate.clone(), idx);
                lookup_keys.push(candidate.clone());
            }
            if self.options.suffix_variants {
                for variant in suffix_variants(candidate) {
                    if !origin.contains_key(&variant) {
                        origin.insert(variant.clone(), idx);
                        lookup_keys.push(variant);
                    }
                }
            }
        }

        let mut records = self.records.records_for(&lookup_keys)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        records.sort_by_key(|r| origin.get(&r.item_key).copied().unwrap_or(usize::MAX));
        records.dedup_by(|a, b| a.item_key == b.item_key);

        let found: Vec<String> = records.iter().map(|r| r.item_key.clone()).collect();
        let glosses = self.glossary.glosses_for(&found)?;

        let now = self.clock.now();
        let mut hits: Vec<ResonanceHit> = records
            .into_iter()
            .map(|record| {
                let matched = origin
                    .get(&record.item_key)
                    .and_then(|&idx| candidates.get(idx))
                    .cloned()
                    .unwrap_or_else(|| record.item_key.clone());
                let gloss = glosses
                    .get(&record.item_key)
                    .map(|g| excerpt(g, self.options.gloss_max_chars))
                    .unwrap_or_default();
                build_hit(record, matched, gloss, now)
            })
            .collect();

        // stable: equal tiers keep encounter order
        hits.sort_by_key(|h| h.tier);
        Ok(hits)
    }
}

fn build_hit(record: MasteryRecord, matched: String, gloss: String, now: i64) -> ResonanceHit {
    let tier = classify_tier(&record, now);
    let history = match tier {
        Tier::Weak => format!(
            "missed {} times, EF={:.1}",
            record.mistake_count, record.easiness_factor
        ),
        Tier::Mastered => format!(
            "reviewed {} times, {} correct in a row",
            record.repetition_count, record.consecutive_correct
        ),
        Tier::Due => {
            let since = record.next_due.map(unix_to_iso8601).unwrap_or_default();
            format!("due for review since {}", since.get(..10).unwrap_or(&since))
        }
        Tier::Learning => format!(
            "reviewed {} times, EF={:.1}",
            record.repetition_count, record.easiness_factor
        ),
    };
    let rationale = if gloss.is_empty() {
        history
    } else {
        format!("{history} ({gloss})")
    };

    ResonanceHit {
        item_key: record.item_key,
        matched,
        tier,
        rationale,
        gloss,
        easiness_factor: record.easiness_factor,
        repetition_count: record.repetition_count,
        mistake_count: record.mistake_count,
        consecutive_correct: record.consecutive_correct,
    }
}

/// First line of `gloss`, at most `max_chars` characters.
fn excerpt(gloss: &str, max_chars: usize) -> String {
    let first_line = gloss.lines().next().unwrap_or("").trim();
    first_line.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::time::FixedClock;

    const NOW: i64 = 1_771_632_000;

    fn record(key: &str) -> MasteryRecord {
        let mut r = MasteryRecord::new(key);
        r.repetition_count = 1;
        r.interval_days = 1;
        r.next_due = Some(NOW + 86_400);
        r
    }

    fn weak(key: &str) -> MasteryRecord {
        let mut r = record(key);
        r.easiness_factor = 1.3;
        r.mistake_count = 3;
        r
    }

    fn store(records: Vec<MasteryRecord>) -> HashMap<String, MasteryRecord> {
        records
            .into_iter()
            .map(|r| (r.item_key.clone(), r))
            .collect()
    }

    fn scanner<'a>(
        records: &'a HashMap<String, MasteryRecord>,
        glossary: &'a HashMap<String, String>,
    ) -> ResonanceScanner<&'a HashMap<String, MasteryRecord>, &'a HashMap<String, String>, FixedClock>
    {
        ResonanceScanner::new(records, glossary, FixedClock(NOW))
    }

    struct Unreachable;

    impl MasteryLookup for Unreachable {
        fn records_for(&self, _keys: &[String]) -> Result<Vec<MasteryRecord>> {
            Err(EngineError::DataUnavailable("connection refused".into()))
        }
    }

    struct GlossaryDown;

    impl GlossaryLookup for GlossaryDown {
        fn glosses_for(&self, _keys: &[String]) -> Result<HashMap<String, String>> {
            Err(EngineError::DataUnavailable("dictionary offline".into()))
        }
    }

    #[test]
    fn test_tier_precedence() {
        let mut r = record("x");
        assert_eq!(classify_tier(&r, NOW), Tier::Learning);

        r.next_due = Some(NOW);
        assert_eq!(classify_tier(&r, NOW), Tier::Due, "due is inclusive");

        r.repetition_count = 5;
        r.consecutive_correct = 3;
        assert_eq!(classify_tier(&r, NOW), Tier::Mastered);

        r.mistake_count = 2;
        assert_eq!(classify_tier(&r, NOW), Tier::Weak);

        let mut low_ef = record("y");
        low_ef.easiness_factor = 1.99;
        assert_eq!(classify_tier(&low_ef, NOW), Tier::Weak);
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let records = store(vec![record("prone")]);
        let glossary = HashMap::new();
        let hits = scanner(&records, &glossary)
            .scan("Nothing studied appears here.")
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_empty_text() {
        let records = store(vec![record("prone")]);
        let glossary = HashMap::new();
        assert!(scanner(&records, &glossary).scan("").unwrap().is_empty());
        assert!(scanner(&records, &glossary).scan("the of and").unwrap().is_empty());
    }

    #[test]
    fn test_weak_ranks_ahead_of_learning() {
        let records = store(vec![record("prone"), weak("inexorable")]);
        let glossary = HashMap::new();
        let hits = scanner(&records, &glossary)
            .scan("Societies are prone to an inexorable decline.")
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].item_key, "inexorable");
        assert_eq!(hits[0].tier, Tier::Weak);
        assert_eq!(hits[0].mistake_count, 3);
        assert_eq!(hits[0].rationale, "missed 3 times, EF=1.3");
        assert_eq!(hits[1].item_key, "prone");
        assert_eq!(hits[1].tier, Tier::Learning);
    }

    #[test]
    fn test_full_tier_ordering_with_encounter_ties() {
        let mut mastered = record("alpha");
        mastered.repetition_count = 6;
        mastered.consecutive_correct = 4;
        let mut due = record("bravo");
        due.next_due = Some(NOW - 10);
        let learning_a = record("charlie");
        let weak_a = weak("delta");
        let learning_b = record("echo");
        let weak_b = weak("foxtrot");

        let records = store(vec![mastered, due, learning_a, weak_a, learning_b, weak_b]);
        let glossary = HashMap::new();
        let hits = scanner(&records, &glossary)
            .scan("alpha bravo charlie delta echo foxtrot")
            .unwrap();

        let order: Vec<(&str, Tier)> = hits.iter().map(|h| (h.item_key.as_str(), h.tier)).collect();
        assert_eq!(
            order,
            vec![
                ("delta", Tier::Weak),
                ("foxtrot", Tier::Weak),
                ("bravo", Tier::Due),
                ("charlie", Tier::Learning),
                ("echo", Tier::Learning),
                ("alpha", Tier::Mastered),
            ]
        );
        assert!(hits[2].rationale.starts_with("due for review since 2026-02-20"));
    }

    #[test]
    fn test_gloss_first_line_truncated() {
        let records = store(vec![weak("inexorable")]);
        let glossary: HashMap<String, String> = [(
            "inexorable".to_string(),
            "adj. relentless; impossible to stop or prevent by any means whatsoever\nsecond line"
                .to_string(),
        )]
        .into_iter()
        .collect();

        let hits = scanner(&records, &glossary).scan("inexorable").unwrap();
        assert_eq!(hits[0].gloss.chars().count(), 40);
        assert!(hits[0].gloss.starts_with("adj. relentless"));
        assert!(!hits[0].gloss.contains("second"));
        assert!(hits[0].rationale.ends_with(&format!("({})", hits[0].gloss)));
    }

    #[test]
    fn test_gloss_truncation_counts_characters() {
        assert_eq!(excerpt("不可遏制的；无情的", 4), "不可遏制");
        assert_eq!(excerpt("", 40), "");
        assert_eq!(excerpt("\nsecond", 40), "");
    }

    #[test]
    fn test_missing_gloss_is_empty() {
        let records = store(vec![record("prone")]);
        let hits = ResonanceScanner::new(&records, NoGlossary, FixedClock(NOW))
            .scan("prone")
            .unwrap();
        assert_eq!(hits[0].gloss, "");
        assert_eq!(hits[0].rationale, "reviewed 1 times, EF=2.5");
    }

    #[test]
    fn test_suffix_variant_matches() {
        let records = store(vec![record("decline")]);
        let glossary = HashMap::new();
        let hits = scanner(&records, &glossary)
            .scan("Output declines steadily.")
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item_key, "decline");
        assert_eq!(hits[0].matched, "declines");
    }

    #[test]
    fn test_suffix_variants_known_gap() {
        let records = store(vec![record("decline")]);
        let glossary = HashMap::new();
        let hits = scanner(&records, &glossary).scan("Output declined.").unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_suffix_variants_can_be_disabled() {
        let records = store(vec![record("decline")]);
        let glossary = HashMap::new();
        let hits = scanner(&records, &glossary)
            .with_options(ScanOptions {
                suffix_variants: false,
                ..ScanOptions::default()
            })
            .scan("declines")
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_exact_and_variant_yield_one_hit() {
        let records = store(vec![record("decline")]);
        let glossary = HashMap::new();
        let hits = scanner(&records, &glossary)
            .scan("declines and decline")
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched, "declines");
    }

    #[test]
    fn test_unreachable_store_is_error() {
        let err = ResonanceScanner::new(Unreachable, NoGlossary, FixedClock(NOW))
            .scan("inexorable decline")
            .unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable(_)));
    }

    #[test]
    fn test_unreachable_store_not_consulted_for_empty_text() {
        let hits = ResonanceScanner::new(Unreachable, NoGlossary, FixedClock(NOW))
            .scan("the and of")
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_glossary_failure_is_error() {
        let records = store(vec![weak("decline")]);
        let err = ResonanceScanner::new(&records, GlossaryDown, FixedClock(NOW))
            .scan("a long decline")
            .unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable(_)));
    }

    #[test]
    fn test_glossary_not_consulted_without_hits() {
        let records = store(vec![weak("decline")]);
        let hits = ResonanceScanner::new(&records, GlossaryDown, FixedClock(NOW))
            .scan("the empire rose")
            .unwrap();
        assert!(hits.is_empty());
    }
}
