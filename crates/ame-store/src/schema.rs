use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "wal_autocheckpoint", 100)?;

    // Non-fatal: in-memory and fresh databases legitimately fail this.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::info!("startup WAL checkpoint complete");
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS mastery_records (
            learner_id          TEXT NOT NULL,
            item_key            TEXT NOT NULL,
            repetition_count    INTEGER NOT NULL DEFAULT 0,
            easiness_factor     REAL NOT NULL DEFAULT 2.5,
            interval_days       INTEGER NOT NULL DEFAULT 0,
            next_due            INTEGER,
            last_reviewed       INTEGER,
            mistake_count       INTEGER NOT NULL DEFAULT 0,
            consecutive_correct INTEGER NOT NULL DEFAULT 0,
            total_reviews       INTEGER NOT NULL DEFAULT 0,
            correct_reviews     INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (learner_id, item_key)
        );

        CREATE TABLE IF NOT EXISTS engagement (
            learner_id       TEXT PRIMARY KEY,
            vitality         INTEGER NOT NULL,
            vitality_ceiling INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS glossary (
            item_key TEXT PRIMARY KEY,
            gloss    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS exam_history (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            learner_id  TEXT NOT NULL,
            section     TEXT NOT NULL,
            grade       TEXT NOT NULL,
            score       REAL,
            passed      INTEGER NOT NULL,
            damage      INTEGER NOT NULL,
            answered_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_mastery_due ON mastery_records(learner_id, next_due);
        CREATE INDEX IF NOT EXISTS idx_exam_recent ON exam_history(learner_id, answered_at);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
