//! History repository for JSON storage
//!
//! Keeps backup records in `history.json`. Every mutation is written through
//! to disk atomically before it returns; if the write fails, the in-memory
//! change is rolled back so memory and disk never disagree.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BackupError;
use crate::models::{BackupCounts, BackupKind, BackupRecord, NewBackupRecord, RecordId};

use super::file_io::{read_json, write_json_atomic};
use super::memory::MemoryHistoryStore;
use super::HistoryStore;

/// Serializable history file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryData {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default)]
    records: Vec<BackupRecord>,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for HistoryData {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            records: Vec::new(),
        }
    }
}

/// Durable history store backed by a JSON file
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    records: MemoryHistoryStore,
}

impl JsonHistoryStore {
    /// Open the history file, treating a missing file as empty history
    pub fn open(path: PathBuf) -> Result<Self, BackupError> {
        let data: HistoryData = read_json(&path)?;
        Ok(Self {
            path,
            records: MemoryHistoryStore::with_records(data.records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), BackupError> {
        let data = HistoryData {
            schema_version: default_schema_version(),
            records: self.records.snapshot()?,
        };
        write_json_atomic(&self.path, &data)
    }
}

impl HistoryStore for JsonHistoryStore {
    fn append(&self, record: NewBackupRecord) -> Result<RecordId, BackupError> {
        let id = self.records.append(record)?;
        if let Err(e) = self.save() {
            let _ = self.records.take(id);
            return Err(e);
        }
        Ok(id)
    }

    fn get(&self, id: RecordId) -> Result<Option<BackupRecord>, BackupError> {
        self.records.get(id)
    }

    fn query_today(
        &self,
        kind: BackupKind,
        day_start: DateTime<Utc>,
    ) -> Result<bool, BackupError> {
        self.records.query_today(kind, day_start)
    }

    fn list_expired(
        &self,
        kind: BackupKind,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<BackupRecord>, BackupError> {
        self.records.list_expired(kind, cutoff)
    }

    fn most_recent(&self) -> Result<Option<BackupRecord>, BackupError> {
        self.records.most_recent()
    }

    fn counts(&self) -> Result<BackupCounts, BackupError> {
        self.records.counts()
    }

    fn delete(&self, id: RecordId) -> Result<(), BackupError> {
        let removed = self.records.take(id)?;
        if let Err(e) = self.save() {
            let _ = self.records.restore(removed);
            return Err(e);
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<BackupRecord>, BackupError> {
        self.records.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn new_record(kind: BackupKind, created_at: DateTime<Utc>) -> NewBackupRecord {
        NewBackupRecord {
            filename: "backup_auto_20250101_020000.db.enc".into(),
            kind,
            size_bytes: 2048,
            created_at,
            file_path: PathBuf::from("backups/backup_auto_20250101_020000.db.enc"),
            checksum: "cd".repeat(32),
            encrypted: true,
        }
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::open(temp_dir.path().join("history.json")).unwrap();

        assert_eq!(store.counts().unwrap(), BackupCounts::default());
        assert!(store.most_recent().unwrap().is_none());
    }

    #[test]
    fn test_append_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        let now = Utc::now();

        let id = {
            let store = JsonHistoryStore::open(path.clone()).unwrap();
            store.append(new_record(BackupKind::Automatic, now)).unwrap()
        };

        let reopened = JsonHistoryStore::open(path).unwrap();
        let record = reopened.get(id).unwrap().unwrap();
        assert_eq!(record.created_at, now);
        assert!(record.encrypted);
        assert_eq!(record.checksum, "cd".repeat(32));
    }

    #[test]
    fn test_delete_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        let now = Utc::now();

        let store = JsonHistoryStore::open(path.clone()).unwrap();
        let old = store
            .append(new_record(BackupKind::Automatic, now - Duration::days(40)))
            .unwrap();
        let kept = store.append(new_record(BackupKind::Manual, now)).unwrap();
        store.delete(old).unwrap();

        let reopened = JsonHistoryStore::open(path).unwrap();
        assert!(reopened.get(old).unwrap().is_none());
        assert!(reopened.get(kept).unwrap().is_some());
        assert_eq!(reopened.counts().unwrap().total, 1);
    }

    #[test]
    fn test_failed_write_rolls_back_append() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the history file should be makes the rename fail
        let path = temp_dir.path().join("history.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();

        let store = JsonHistoryStore {
            path: path.clone(),
            records: MemoryHistoryStore::new(),
        };

        let result = store.append(new_record(BackupKind::Manual, Utc::now()));
        assert!(matches!(result, Err(BackupError::Store(_))));
        assert_eq!(store.counts().unwrap().total, 0);
    }

    #[test]
    fn test_corrupt_history_is_store_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        std::fs::write(&path, "[[[").unwrap();

        let err = JsonHistoryStore::open(path).unwrap_err();
        assert!(matches!(err, BackupError::Store(_)));
    }
}
