//! Property tests for the scheduling and vitality invariants.

use proptest::prelude::*;

use ame_core::{
    EF_MIN, EngagementState, Grade, HealSource, Quality, SchedulingState, Section, classify,
    damage, heal, schedule,
};

const NOW: i64 = 1_771_632_000;

fn arb_section() -> impl Strategy<Value = Section> {
    prop_oneof![
        Just(Section::UseOfEnglish),
        Just(Section::ReadingA),
        Just(Section::ReadingB),
        Just(Section::Translation),
        Just(Section::WritingA),
        Just(Section::WritingB),
        "[a-z_]{1,12}".prop_map(|s| Section::parse(&s)),
    ]
}

fn arb_grade() -> impl Strategy<Value = Grade> {
    prop_oneof![
        Just(Grade::Correct),
        Just(Grade::Wrong),
        (-5.0f64..30.0).prop_map(Grade::Scored),
    ]
}

#[derive(Debug, Clone)]
enum Event {
    Exam(Section, Grade),
    Review(i64),
    Lookup,
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (arb_section(), arb_grade()).prop_map(|(s, g)| Event::Exam(s, g)),
        (-3i64..9).prop_map(Event::Review),
        Just(Event::Lookup),
    ]
}

proptest! {
    #[test]
    fn easiness_never_below_floor(qualities in prop::collection::vec(-10i64..10, 1..40)) {
        let mut state = SchedulingState::default();
        for q in qualities {
            let next = schedule(Quality::new(q), state, NOW);
            prop_assert!(next.easiness_factor >= EF_MIN);
            state = next.scheduling_state();
        }
    }

    #[test]
    fn failed_review_resets(
        reps in 0u32..50,
        ef in 1.3f64..3.5,
        interval in 0u32..400,
        q in 0i64..3,
    ) {
        let prior = SchedulingState { repetition_count: reps, easiness_factor: ef, interval_days: interval };
        let next = schedule(Quality::new(q), prior, NOW);
        prop_assert_eq!(next.repetition_count, 0);
        prop_assert_eq!(next.interval_days, 0);
        prop_assert_eq!(next.next_due, NOW);
    }

    #[test]
    fn passed_review_advances(reps in 0u32..50, interval in 1u32..400, q in 3i64..6) {
        let prior = SchedulingState { repetition_count: reps, easiness_factor: 2.5, interval_days: interval };
        let next = schedule(Quality::new(q), prior, NOW);
        prop_assert_eq!(next.repetition_count, reps + 1);
        prop_assert!(next.interval_days >= 1);
        prop_assert!(next.next_due > NOW);
    }

    #[test]
    fn vitality_stays_in_bounds(
        ceiling in -10i64..300,
        start in -50i64..400,
        events in prop::collection::vec(arb_event(), 0..60),
    ) {
        let mut state = EngagementState::new(start, ceiling);
        for event in events {
            match event {
                Event::Exam(section, grade) => {
                    state.take_damage(&damage(&section, grade));
                }
                Event::Review(q) => {
                    state.heal(heal(HealSource::Review(Quality::new(q))));
                }
                Event::Lookup => {
                    state.heal(heal(HealSource::GlossaryLookup));
                }
            }
            prop_assert!(state.vitality() >= 0);
            prop_assert!(state.vitality() <= state.vitality_ceiling());
            prop_assert!(state.vitality_ceiling() >= 1);
        }
    }

    #[test]
    fn damage_is_bounded(section in arb_section(), grade in arb_grade()) {
        let d = damage(&section, grade);
        prop_assert!(d.total() <= 25);
        prop_assert_eq!(d.fallback, !section.is_recognized());
    }

    #[test]
    fn mood_is_a_pure_function(vitality in -100i64..300, ceiling in -10i64..300) {
        prop_assert_eq!(classify(vitality, ceiling), classify(vitality, ceiling));
    }
}
