use std::fs;
use std::path::Path;

use ame_core::{ProgressBackup, export_json, import_json};

use crate::error::{Result, StoreError};
use crate::store::{Store, set_engagement_on, upsert_record_on};

impl Store {
    /// Import a progress backup file for `learner_id`.
    pub fn import_json_file(&self, learner_id: &str, path: &Path) -> Result<usize> {
        let json = fs::read_to_string(path)?;
        self.import_json_str(learner_id, &json)
    }

    /// Import a progress backup string for `learner_id`, upserting every
    /// record and replacing the engagement row. Returns the record count.
    ///
    /// The learner named inside the backup is ignored; backups can be moved
    /// between learners.
    pub fn import_json_str(&self, learner_id: &str, json: &str) -> Result<usize> {
        let backup: ProgressBackup =
            import_json(json).map_err(|e| StoreError::InvalidData(format!("invalid JSON: {e}")))?;

        let count = self.transaction(|conn| {
            for record in &backup.records {
                upsert_record_on(conn, learner_id, record)?;
            }
            set_engagement_on(conn, learner_id, &backup.engagement)?;
            Ok(backup.records.len())
        })?;

        tracing::info!(learner_id, records = count, "imported progress backup");
        Ok(count)
    }

    pub fn export_json_file(&self, learner_id: &str, path: &Path, exported_at: i64) -> Result<()> {
        let json = self.export_json_string(learner_id, exported_at)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Export `learner_id`'s records and engagement, stamped with
    /// `exported_at` (Unix seconds). A learner with no engagement row
    /// exports at full default vitality.
    pub fn export_json_string(&self, learner_id: &str, exported_at: i64) -> Result<String> {
        let records = self.all_records(learner_id)?;
        let engagement = self.get_engagement(learner_id)?.unwrap_or_default();
        export_json(learner_id, &engagement, &records, exported_at)
            .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ame_core::{EngagementState, MasteryRecord};

    const NOW: i64 = 1_771_632_000;

    fn seeded() -> Store {
        let store = Store::open_in_memory().unwrap();
        let mut weak = MasteryRecord::new("decline");
        weak.easiness_factor = 1.42;
        weak.mistake_count = 2;
        weak.next_due = Some(NOW);
        weak.last_reviewed = Some(NOW);
        store.upsert_record("u1", &weak).unwrap();
        store.upsert_record("u1", &MasteryRecord::new("prone")).unwrap();
        store
            .set_engagement("u1", &EngagementState::new(58, 100))
            .unwrap();
        store
    }

    #[test]
    fn test_export_import_between_stores() {
        let source = seeded();
        let json = source.export_json_string("u1", NOW).unwrap();

        let target = Store::open_in_memory().unwrap();
        assert_eq!(target.import_json_str("u9", &json).unwrap(), 2);

        assert_eq!(
            target.all_records("u9").unwrap(),
            source.all_records("u1").unwrap()
        );
        assert_eq!(
            target.get_engagement("u9").unwrap(),
            Some(EngagementState::new(58, 100))
        );
        assert!(target.all_records("u1").unwrap().is_empty());
    }

    #[test]
    fn test_import_upserts_existing() {
        let store = seeded();
        let json = store.export_json_string("u1", NOW).unwrap();
        store.import_json_str("u1", &json).unwrap();
        assert_eq!(store.record_count("u1").unwrap(), 2);
    }

    #[test]
    fn test_invalid_json_rejected() {
        let store = Store::open_in_memory().unwrap();
        let err = store.import_json_str("u1", "{\"records\": 5}").unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        assert_eq!(store.record_count("u1").unwrap(), 0);
    }

    #[test]
    fn test_missing_file() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .import_json_file("u1", Path::new("/nonexistent/backup.json"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn test_file_roundtrip_stamps_given_time() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("backup.json");
        let source = seeded();
        source.export_json_file("u1", &path, NOW).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"exportedAt\": \"2026-02-21T00:00:00Z\""));

        let target = Store::open_in_memory().unwrap();
        assert_eq!(target.import_json_file("u1", &path).unwrap(), 2);
        assert_eq!(target.all_records("u1").unwrap(), source.all_records("u1").unwrap());
    }

    #[test]
    fn test_export_to_missing_directory() {
        let store = seeded();
        let err = store
            .export_json_file("u1", Path::new("/nonexistent/dir/backup.json"), NOW)
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
