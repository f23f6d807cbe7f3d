//! The calling layer around the engine.
//!
//! Every learner action is one SQLite transaction: read the record and the
//! engagement row, run the engine, write both back. Concurrent actions for
//! the same learner serialize on the database write lock.

use std::fs;
use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;

use ame_core::{
    Clock, Damage, EngagementState, ExamOutcome, Grade, HealSource, LearnerSnapshot,
    MasteryRecord, MoodReading, ProgressStats, Quality, RECENT_EXAM_WINDOW, ResonanceHit,
    ResonanceScanner, Schedule, Section, SystemClock, damage, due_queue, heal, normalize_key,
    progress_stats, schedule,
};

use crate::config::{CONFIG_FILE, DATABASE_FILE, EngineConfig, data_dir};
use crate::error::{Result, StoreError};
use crate::store::{
    Store, get_engagement_on, get_record_on, insert_exam_on, set_engagement_on, upsert_record_on,
};

/// Outcome of one recorded review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewReceipt {
    pub record: MasteryRecord,
    pub schedule: Schedule,
    pub healed: u32,
    pub engagement: EngagementState,
    pub mood: MoodReading,
}

/// Outcome of one graded exam answer.
#[derive(Debug, Clone, Serialize)]
pub struct ExamReceipt {
    pub section: Section,
    pub passed: bool,
    pub damage: Damage,
    /// Signed change actually applied after clamping.
    pub vitality_change: i64,
    pub engagement: EngagementState,
    pub mood: MoodReading,
}

/// Outcome of a glossary lookup during context assembly.
#[derive(Debug, Clone, Serialize)]
pub struct LookupReceipt {
    pub item_key: String,
    pub gloss: Option<String>,
    pub healed: u32,
    pub engagement: EngagementState,
    pub mood: MoodReading,
}

pub struct Tracker<C = SystemClock> {
    store: Store,
    config: EngineConfig,
    clock: C,
}

impl Tracker<SystemClock> {
    /// Open the tracker rooted at `dir` (or the resolved data directory),
    /// creating it if needed.
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        let base = data_dir(dir);
        fs::create_dir_all(&base)?;

        let config = EngineConfig::load(&base.join(CONFIG_FILE))?;
        let store = Store::open(&base.join(DATABASE_FILE))?;
        tracing::info!(dir = %base.display(), "tracker opened");

        Ok(Self::with_clock(store, config, SystemClock))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::with_clock(
            Store::open_in_memory()?,
            EngineConfig::default(),
            SystemClock,
        ))
    }
}

impl<C: Clock> Tracker<C> {
    pub fn with_clock(store: Store, config: EngineConfig, clock: C) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current engagement; a learner never seen before is at full vitality.
    pub fn engagement(&self, learner_id: &str) -> Result<EngagementState> {
        engagement_or_default(self.store.conn(), learner_id, &self.config)
    }

    /// Record a self-rated review of `item`, creating its record on first
    /// sight, and apply the review heal.
    pub fn record_review(
        &self,
        learner_id: &str,
        item: &str,
        quality: Quality,
    ) -> Result<ReviewReceipt> {
        let item_key = normalize_key(item);
        if item_key.is_empty() {
            return Err(StoreError::InvalidData("empty item key".to_string()));
        }
        let now = self.clock.now();

        let receipt = self.store.transaction(|conn| {
            let mut record = get_record_on(conn, learner_id, &item_key)?
                .unwrap_or_else(|| MasteryRecord::new(&item_key));
            let next = schedule(quality, record.scheduling_state(), now);
            record.record_review(quality, &next, now);
            upsert_record_on(conn, learner_id, &record)?;

            let mut engagement = engagement_or_default(conn, learner_id, &self.config)?;
            let healed = heal(HealSource::Review(quality));
            engagement.heal(healed);
            set_engagement_on(conn, learner_id, &engagement)?;

            Ok(ReviewReceipt {
                record,
                schedule: next,
                healed,
                engagement,
                mood: engagement.mood(),
            })
        })?;

        tracing::debug!(
            learner_id,
            item = %item_key,
            quality = quality.value(),
            interval_days = receipt.schedule.interval_days,
            vitality = receipt.engagement.vitality(),
            "review recorded"
        );
        Ok(receipt)
    }

    /// Record a flashcard answer, rated via [`Quality::from_answer`].
    pub fn record_answer(
        &self,
        learner_id: &str,
        item: &str,
        is_correct: bool,
        felt_easy: Option<bool>,
    ) -> Result<ReviewReceipt> {
        self.record_review(learner_id, item, Quality::from_answer(is_correct, felt_easy))
    }

    /// Charge the vitality cost of one graded exam answer and append it to
    /// the learner's exam history.
    pub fn record_exam(
        &self,
        learner_id: &str,
        section: &Section,
        grade: Grade,
    ) -> Result<ExamReceipt> {
        let cost = damage(section, grade);
        if cost.fallback {
            tracing::warn!(
                learner_id,
                section = %section,
                "no damage rule for exam section, applying fallback"
            );
        }
        let outcome = ExamOutcome::new(section, grade, self.clock.now());

        let (vitality_change, engagement) = self.store.transaction(|conn| {
            let mut engagement = engagement_or_default(conn, learner_id, &self.config)?;
            let applied = engagement.take_damage(&cost);
            set_engagement_on(conn, learner_id, &engagement)?;
            insert_exam_on(conn, learner_id, &outcome)?;
            Ok((applied, engagement))
        })?;

        tracing::debug!(
            learner_id,
            section = %section,
            passed = outcome.passed,
            damage = cost.total(),
            vitality = engagement.vitality(),
            "exam answer recorded"
        );
        Ok(ExamReceipt {
            section: section.clone(),
            passed: outcome.passed,
            damage: cost,
            vitality_change,
            engagement,
            mood: engagement.mood(),
        })
    }

    /// Look up a gloss on demand. The lookup itself restores vitality.
    pub fn glossary_lookup(&self, learner_id: &str, item: &str) -> Result<LookupReceipt> {
        let item_key = normalize_key(item);
        let gloss = self.store.get_gloss(&item_key)?;
        let healed = heal(HealSource::GlossaryLookup);

        let engagement = self.store.transaction(|conn| {
            let mut engagement = engagement_or_default(conn, learner_id, &self.config)?;
            engagement.heal(healed);
            set_engagement_on(conn, learner_id, &engagement)?;
            Ok(engagement)
        })?;

        tracing::debug!(
            learner_id,
            item = %item_key,
            found = gloss.is_some(),
            "glossary lookup"
        );
        Ok(LookupReceipt {
            item_key,
            gloss,
            healed,
            engagement,
            mood: engagement.mood(),
        })
    }

    /// Studied words in `text`, most urgent first. Read-only.
    pub fn scan_passage(&self, learner_id: &str, text: &str) -> ame_core::Result<Vec<ResonanceHit>> {
        let view = self.store.learner(learner_id);
        let scanner = ResonanceScanner::new(view, view, &self.clock)
            .with_options(self.config.scan_options());

        scanner.scan(text).inspect_err(|e| {
            tracing::error!(learner_id, error = %e, "resonance scan failed");
        })
    }

    pub fn stats(&self, learner_id: &str) -> Result<ProgressStats> {
        let records = self.store.all_records(learner_id)?;
        Ok(progress_stats(&records, self.clock.now()))
    }

    pub fn snapshot(&self, learner_id: &str) -> Result<LearnerSnapshot> {
        let stats = self.stats(learner_id)?;
        let engagement = self.engagement(learner_id)?;
        let recent = self.store.recent_exams(learner_id, RECENT_EXAM_WINDOW)?;
        Ok(LearnerSnapshot::new(&engagement, &stats, &recent))
    }

    /// Progress backup for `learner_id`, stamped with the tracker's clock.
    pub fn export_backup(&self, learner_id: &str) -> Result<String> {
        self.store.export_json_string(learner_id, self.clock.now())
    }

    pub fn export_backup_file(&self, learner_id: &str, path: &Path) -> Result<()> {
        self.store.export_json_file(learner_id, path, self.clock.now())
    }

    /// Next review batch, sized by `queue.due_batch_size`.
    pub fn due_batch(&self, learner_id: &str) -> Result<Vec<MasteryRecord>> {
        let records = self.store.all_records(learner_id)?;
        Ok(due_queue(&records, self.clock.now(), self.config.queue.due_batch_size)
            .into_iter()
            .cloned()
            .collect())
    }
}

fn engagement_or_default(
    conn: &Connection,
    learner_id: &str,
    config: &EngineConfig,
) -> Result<EngagementState> {
    Ok(get_engagement_on(conn, learner_id)?.unwrap_or_else(|| {
        EngagementState::full(config.engagement.default_vitality_ceiling)
    }))
}
