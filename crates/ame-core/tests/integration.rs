//! Integration tests exercising the engine end to end:
//! review → write-back → heal → mood, exam damage sequences, and scanning.

use std::collections::HashMap;

use ame_core::{
    EngagementState, FixedClock, Grade, HealSource, MasteryRecord, Mood, Quality, ResonanceScanner,
    ReviewScheduler, Section, Tier, damage, export_json, heal, import_json, progress_stats,
};

const NOW: i64 = 1_771_632_000;
const DAY: i64 = 86_400;

const PASSAGE: &str = "\
Prone to inexorable decline, the ubiquitous empire declined \
slowly. Historians still argue about which decline came first.";

fn studied_records() -> HashMap<String, MasteryRecord> {
    let mut decline = MasteryRecord::new("decline");
    decline.mistake_count = 2;
    decline.easiness_factor = 1.7;
    decline.next_due = Some(NOW + DAY);

    let mut prone = MasteryRecord::new("prone");
    prone.repetition_count = 5;
    prone.consecutive_correct = 3;
    prone.next_due = Some(NOW - 3 * DAY);

    let mut inexorable = MasteryRecord::new("inexorable");
    inexorable.repetition_count = 2;
    inexorable.next_due = Some(NOW - DAY);

    let mut ubiquitous = MasteryRecord::new("ubiquitous");
    ubiquitous.repetition_count = 1;
    ubiquitous.next_due = Some(NOW + 5 * DAY);

    [decline, prone, inexorable, ubiquitous]
        .into_iter()
        .map(|r| (r.item_key.clone(), r))
        .collect()
}

/// A word learned over several sessions, then forgotten.
#[test]
fn review_sequence_then_lapse() {
    let mut record = MasteryRecord::new("Inexorable");
    let mut now = NOW;

    for expected_interval in [1, 6, 15] {
        let scheduler = ReviewScheduler::new(FixedClock(now));
        let (updated, schedule) = scheduler.review(&record, Quality::new(4));
        assert_eq!(schedule.interval_days, expected_interval);
        assert_eq!(updated.easiness_factor, 2.5);
        now = schedule.next_due;
        record = updated;
    }
    assert_eq!(record.item_key, "inexorable");
    assert_eq!(record.repetition_count, 3);
    assert_eq!(record.consecutive_correct, 3);

    let scheduler = ReviewScheduler::new(FixedClock(now));
    let (lapsed, schedule) = scheduler.review(&record, Quality::new(1));
    assert_eq!(schedule.repetition_count, 0);
    assert_eq!(schedule.interval_days, 0);
    assert_eq!(schedule.next_due, now);
    assert_eq!(lapsed.easiness_factor, 1.96);
    assert_eq!(lapsed.mistake_count, 1);
    assert_eq!(lapsed.consecutive_correct, 0);
    assert_eq!(lapsed.total_reviews, 4);
    assert_eq!(lapsed.correct_reviews, 3);
}

/// A mock exam drains vitality; reviews bring the learner back.
#[test]
fn exam_drains_then_reviews_recover() {
    let mut state = EngagementState::default();

    let answers = [
        (Section::ReadingA, Grade::Wrong),
        (Section::parse("cloze"), Grade::Wrong),
        (Section::UseOfEnglish, Grade::Correct),
        (Section::Translation, Grade::Scored(0.0)),
        (Section::WritingB, Grade::Scored(8.0)),
    ];
    let costs: Vec<u32> = answers
        .iter()
        .map(|(section, grade)| {
            let d = damage(section, *grade);
            state.take_damage(&d);
            d.total()
        })
        .collect();
    assert_eq!(costs, vec![5, 2, 0, 5, 9]);
    assert_eq!(state.vitality(), 79);
    assert_eq!(state.mood().mood, Mood::Engaged);

    state.heal(heal(HealSource::Review(Quality::new(5))));
    state.heal(heal(HealSource::Review(Quality::new(3))));
    state.heal(heal(HealSource::GlossaryLookup));
    assert_eq!(state.vitality(), 82);
    assert_eq!(state.mood().mood, Mood::Thriving);
}

#[test]
fn exhaustion_floor_and_recovery() {
    let mut state = EngagementState::full(20);
    for _ in 0..10 {
        state.take_damage(&damage(&Section::WritingA, Grade::Scored(0.0)));
    }
    assert_eq!(state.vitality(), 0);
    assert!(state.mood().mood.blocks_practice());

    state.heal(heal(HealSource::Review(Quality::new(4))));
    assert_eq!(state.vitality(), 1);
    assert_eq!(state.mood().mood, Mood::Distressed);
}

#[test]
fn unknown_section_uses_fallback() {
    let d = damage(&Section::parse("listening"), Grade::Wrong);
    assert!(d.fallback);
    assert_eq!(d.total(), 3);
}

/// Scanning a passage surfaces studied words by urgency.
#[test]
fn scan_orders_hits_by_tier() {
    let records = studied_records();
    let glossary: HashMap<String, String> = [(
        "inexorable".to_string(),
        "adj. impossible to stop or prevent\nsee also: relentless".to_string(),
    )]
    .into_iter()
    .collect();

    let scanner = ResonanceScanner::new(&records, &glossary, FixedClock(NOW));
    let hits = scanner.scan(PASSAGE).unwrap();

    let keys: Vec<(&str, Tier)> = hits.iter().map(|h| (h.item_key.as_str(), h.tier)).collect();
    assert_eq!(
        keys,
        vec![
            ("decline", Tier::Weak),
            ("inexorable", Tier::Due),
            ("ubiquitous", Tier::Learning),
            ("prone", Tier::Mastered),
        ]
    );
    assert_eq!(
        hits[1].rationale,
        "due for review since 2026-02-20 (adj. impossible to stop or prevent)"
    );
    assert_eq!(hits[0].rationale, "missed 2 times, EF=1.7");
}

#[test]
fn scan_without_matches_is_empty() {
    let records = studied_records();
    let scanner = ResonanceScanner::new(&records, ame_core::NoGlossary, FixedClock(NOW));
    assert!(scanner.scan("Nothing studied appears here.").unwrap().is_empty());
    assert!(scanner.scan("").unwrap().is_empty());
}

#[test]
fn stats_and_backup_agree() {
    let records: Vec<MasteryRecord> = studied_records().into_values().collect();
    let stats = progress_stats(&records, NOW);
    assert_eq!(stats.total_items, 4);
    assert_eq!(stats.weak_items, 1);
    assert_eq!(stats.due_items, 1);
    assert_eq!(stats.mastered_items, 1);
    assert_eq!(stats.learning_items, 1);

    let engagement = EngagementState::new(42, 100);
    let json = export_json("learner-1", &engagement, &records, NOW).unwrap();
    let restored = import_json(&json).unwrap();
    assert_eq!(restored.engagement, engagement);
    assert_eq!(progress_stats(&restored.records, NOW), stats);
}
