use std::collections::HashMap;
use std::path::Path;

use rusqlite::{
    Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params,
    params_from_iter,
};

use ame_core::{
    EF_MIN, EngagementState, EngineError, ExamOutcome, GlossaryLookup, Grade, MasteryLookup,
    MasteryRecord, Section, normalize_key,
};

use crate::error::{Result, StoreError};
use crate::schema;

/// Keys per `IN (...)` query; stays well under SQLite's bound-parameter limit.
const KEY_CHUNK: usize = 500;

const RECORD_COLUMNS: &str = "item_key, repetition_count, easiness_factor, interval_days, \
     next_due, last_reviewed, mistake_count, consecutive_correct, total_reviews, correct_reviews";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction. Rolled back if `f` fails.
    ///
    /// The write lock is taken up front, so two read-modify-write actions
    /// on the same database cannot interleave.
    pub fn transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Mastery records ---

    pub fn get_record(&self, learner_id: &str, item_key: &str) -> Result<Option<MasteryRecord>> {
        get_record_on(&self.conn, learner_id, item_key)
    }

    pub fn upsert_record(&self, learner_id: &str, record: &MasteryRecord) -> Result<()> {
        upsert_record_on(&self.conn, learner_id, record)
    }

    /// Records for whichever of `keys` exist. One query per chunk of keys.
    pub fn records_for(&self, learner_id: &str, keys: &[String]) -> Result<Vec<MasteryRecord>> {
        let mut out = Vec::new();
        for chunk in keys.chunks(KEY_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT {RECORD_COLUMNS} FROM mastery_records
                 WHERE learner_id = ? AND item_key IN ({placeholders})"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let bound = std::iter::once(learner_id).chain(chunk.iter().map(String::as_str));
            let rows = stmt.query_map(params_from_iter(bound), row_to_record)?;
            for row in rows {
                out.push(validate(row?)?);
            }
        }
        Ok(out)
    }

    pub fn all_records(&self, learner_id: &str) -> Result<Vec<MasteryRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM mastery_records WHERE learner_id = ?1 ORDER BY item_key"
        ))?;
        let rows: Vec<MasteryRecord> = stmt
            .query_map([learner_id], row_to_record)?
            .collect::<std::result::Result<_, _>>()?;
        rows.into_iter().map(validate).collect()
    }

    pub fn record_count(&self, learner_id: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM mastery_records WHERE learner_id = ?1",
            [learner_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    // --- Engagement ---

    pub fn get_engagement(&self, learner_id: &str) -> Result<Option<EngagementState>> {
        get_engagement_on(&self.conn, learner_id)
    }

    pub fn set_engagement(&self, learner_id: &str, state: &EngagementState) -> Result<()> {
        set_engagement_on(&self.conn, learner_id, state)
    }

    // --- Exam history ---

    /// The learner's last `limit` graded answers, newest first.
    pub fn recent_exams(&self, learner_id: &str, limit: usize) -> Result<Vec<ExamOutcome>> {
        let mut stmt = self.conn.prepare(
            "SELECT section, grade, score, passed, damage, answered_at FROM exam_history
             WHERE learner_id = ?1 ORDER BY answered_at DESC, id DESC LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![learner_id, limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (section, grade, score, passed, damage, answered_at) = row?;
            out.push(ExamOutcome {
                section: Section::parse(&section),
                grade: grade_from_columns(&grade, score)?,
                passed,
                damage,
                answered_at,
            });
        }
        Ok(out)
    }

    // --- Glossary ---

    pub fn put_gloss(&self, item_key: &str, gloss: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO glossary (item_key, gloss) VALUES (?1, ?2)",
            params![normalize_key(item_key), gloss],
        )?;
        Ok(())
    }

    pub fn get_gloss(&self, item_key: &str) -> Result<Option<String>> {
        let gloss = self
            .conn
            .query_row(
                "SELECT gloss FROM glossary WHERE item_key = ?1",
                [normalize_key(item_key)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(gloss)
    }

    pub fn glosses_for(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        let mut out = HashMap::new();
        for chunk in keys.chunks(KEY_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql =
                format!("SELECT item_key, gloss FROM glossary WHERE item_key IN ({placeholders})");
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (key, gloss) = row?;
                out.insert(key, gloss);
            }
        }
        Ok(out)
    }

    /// Read access scoped to one learner, for the engine's lookup traits.
    pub fn learner<'a>(&'a self, learner_id: &'a str) -> LearnerView<'a> {
        LearnerView {
            store: self,
            learner_id,
        }
    }
}

pub(crate) fn get_record_on(
    conn: &Connection,
    learner_id: &str,
    item_key: &str,
) -> Result<Option<MasteryRecord>> {
    let record = conn
        .query_row(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM mastery_records
                 WHERE learner_id = ?1 AND item_key = ?2"
            ),
            params![learner_id, item_key],
            row_to_record,
        )
        .optional()?;
    record.map(validate).transpose()
}

pub(crate) fn upsert_record_on(
    conn: &Connection,
    learner_id: &str,
    record: &MasteryRecord,
) -> Result<()> {
    conn.execute(
        "INSERT INTO mastery_records (learner_id, item_key, repetition_count, easiness_factor,
             interval_days, next_due, last_reviewed, mistake_count, consecutive_correct,
             total_reviews, correct_reviews)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT (learner_id, item_key) DO UPDATE SET
             repetition_count = excluded.repetition_count,
             easiness_factor = excluded.easiness_factor,
             interval_days = excluded.interval_days,
             next_due = excluded.next_due,
             last_reviewed = excluded.last_reviewed,
             mistake_count = excluded.mistake_count,
             consecutive_correct = excluded.consecutive_correct,
             total_reviews = excluded.total_reviews,
             correct_reviews = excluded.correct_reviews",
        params![
            learner_id,
            record.item_key,
            record.repetition_count,
            record.easiness_factor,
            record.interval_days,
            record.next_due,
            record.last_reviewed,
            record.mistake_count,
            record.consecutive_correct,
            record.total_reviews,
            record.correct_reviews,
        ],
    )?;
    Ok(())
}

pub(crate) fn get_engagement_on(
    conn: &Connection,
    learner_id: &str,
) -> Result<Option<EngagementState>> {
    let state = conn
        .query_row(
            "SELECT vitality, vitality_ceiling FROM engagement WHERE learner_id = ?1",
            [learner_id],
            |row| {
                Ok(EngagementState::new(
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                ))
            },
        )
        .optional()?;
    Ok(state)
}

pub(crate) fn set_engagement_on(
    conn: &Connection,
    learner_id: &str,
    state: &EngagementState,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO engagement (learner_id, vitality, vitality_ceiling)
         VALUES (?1, ?2, ?3)",
        params![learner_id, state.vitality(), state.vitality_ceiling()],
    )?;
    Ok(())
}

pub(crate) fn insert_exam_on(
    conn: &Connection,
    learner_id: &str,
    outcome: &ExamOutcome,
) -> Result<()> {
    let (grade, score) = grade_columns(outcome.grade);
    conn.execute(
        "INSERT INTO exam_history (learner_id, section, grade, score, passed, damage, answered_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            learner_id,
            outcome.section.as_str(),
            grade,
            score,
            outcome.passed,
            outcome.damage,
            outcome.answered_at,
        ],
    )?;
    Ok(())
}

fn grade_columns(grade: Grade) -> (&'static str, Option<f64>) {
    match grade {
        Grade::Correct => ("correct", None),
        Grade::Wrong => ("wrong", None),
        Grade::Scored(score) => ("scored", Some(score)),
    }
}

fn grade_from_columns(kind: &str, score: Option<f64>) -> Result<Grade> {
    match (kind, score) {
        ("correct", _) => Ok(Grade::Correct),
        ("wrong", _) => Ok(Grade::Wrong),
        ("scored", Some(score)) => Ok(Grade::Scored(score)),
        // NaN scores are stored as NULL
        ("scored", None) => Ok(Grade::Scored(0.0)),
        _ => Err(StoreError::InvalidData(format!("unknown exam grade '{kind}'"))),
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<MasteryRecord> {
    Ok(MasteryRecord {
        item_key: row.get(0)?,
        repetition_count: row.get(1)?,
        easiness_factor: row.get(2)?,
        interval_days: row.get(3)?,
        next_due: row.get(4)?,
        last_reviewed: row.get(5)?,
        mistake_count: row.get(6)?,
        consecutive_correct: row.get(7)?,
        total_reviews: row.get(8)?,
        correct_reviews: row.get(9)?,
    })
}

fn validate(record: MasteryRecord) -> Result<MasteryRecord> {
    if !record.easiness_factor.is_finite() || record.easiness_factor < EF_MIN {
        return Err(StoreError::InvalidData(format!(
            "easiness factor {} below {EF_MIN} for '{}'",
            record.easiness_factor, record.item_key
        )));
    }
    Ok(record)
}

/// A [`Store`] seen through one learner's records.
#[derive(Clone, Copy)]
pub struct LearnerView<'a> {
    store: &'a Store,
    learner_id: &'a str,
}

impl MasteryLookup for LearnerView<'_> {
    fn records_for(&self, keys: &[String]) -> ame_core::Result<Vec<MasteryRecord>> {
        self.store
            .records_for(self.learner_id, keys)
            .map_err(EngineError::from)
    }
}

impl GlossaryLookup for LearnerView<'_> {
    fn glosses_for(&self, keys: &[String]) -> ame_core::Result<HashMap<String, String>> {
        self.store.glosses_for(keys).map_err(EngineError::from)
    }
}
