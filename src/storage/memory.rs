//! In-memory history store
//!
//! Backs the JSON store and serves as a fake in tests.

use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::BackupError;
use crate::models::{BackupCounts, BackupKind, BackupRecord, NewBackupRecord, RecordId};

use super::HistoryStore;

/// History store holding records in memory only
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: RwLock<Vec<BackupRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    pub fn with_records(records: Vec<BackupRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Copy of all records in insertion order
    pub fn snapshot(&self) -> Result<Vec<BackupRecord>, BackupError> {
        Ok(self.read()?.clone())
    }

    /// Re-insert a record exactly as given (used to roll back a failed delete)
    pub(crate) fn restore(&self, record: BackupRecord) -> Result<(), BackupError> {
        self.write()?.push(record);
        Ok(())
    }

    /// Remove a record and hand it back
    pub(crate) fn take(&self, id: RecordId) -> Result<BackupRecord, BackupError> {
        let mut records = self.write()?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| BackupError::Store(format!("History record not found: {}", id)))?;
        Ok(records.remove(index))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<BackupRecord>>, BackupError> {
        self.records
            .read()
            .map_err(|e| BackupError::Store(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<BackupRecord>>, BackupError> {
        self.records
            .write()
            .map_err(|e| BackupError::Store(format!("Failed to acquire write lock: {}", e)))
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, record: NewBackupRecord) -> Result<RecordId, BackupError> {
        let mut records = self.write()?;

        // created_at never goes backwards, even if the wall clock does
        let mut record = record;
        if let Some(newest) = records.iter().map(|r| r.created_at).max() {
            record.created_at = record.created_at.max(newest);
        }

        let id = RecordId::new();
        records.push(record.with_id(id));
        Ok(id)
    }

    fn get(&self, id: RecordId) -> Result<Option<BackupRecord>, BackupError> {
        Ok(self.read()?.iter().find(|r| r.id == id).cloned())
    }

    fn query_today(
        &self,
        kind: BackupKind,
        day_start: DateTime<Utc>,
    ) -> Result<bool, BackupError> {
        Ok(self
            .read()?
            .iter()
            .any(|r| r.kind == kind && r.created_at >= day_start))
    }

    fn list_expired(
        &self,
        kind: BackupKind,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<BackupRecord>, BackupError> {
        Ok(self
            .read()?
            .iter()
            .filter(|r| r.kind == kind && r.created_at < cutoff)
            .cloned()
            .collect())
    }

    fn most_recent(&self) -> Result<Option<BackupRecord>, BackupError> {
        Ok(self.read()?.iter().max_by_key(|r| r.created_at).cloned())
    }

    fn counts(&self) -> Result<BackupCounts, BackupError> {
        Ok(BackupCounts::from_records(self.read()?.iter()))
    }

    fn delete(&self, id: RecordId) -> Result<(), BackupError> {
        self.take(id).map(|_| ())
    }

    fn list(&self) -> Result<Vec<BackupRecord>, BackupError> {
        let mut records = self.snapshot()?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::path::PathBuf;

    fn new_record(kind: BackupKind, created_at: DateTime<Utc>) -> NewBackupRecord {
        NewBackupRecord {
            filename: format!("backup_{}.db", created_at.timestamp()),
            kind,
            size_bytes: 10,
            created_at,
            file_path: PathBuf::from("backups").join(format!("backup_{}.db", created_at.timestamp())),
            checksum: "00".repeat(32),
            encrypted: false,
        }
    }

    #[test]
    fn test_append_assigns_ids() {
        let store = MemoryHistoryStore::new();
        let now = Utc::now();

        let id1 = store.append(new_record(BackupKind::Automatic, now)).unwrap();
        let id2 = store.append(new_record(BackupKind::Manual, now)).unwrap();

        assert_ne!(id1, id2);
        assert_eq!(store.get(id1).unwrap().unwrap().kind, BackupKind::Automatic);
        assert_eq!(store.counts().unwrap().total, 2);
    }

    #[test]
    fn test_created_at_is_monotonic() {
        let store = MemoryHistoryStore::new();
        let now = Utc::now();

        store.append(new_record(BackupKind::Manual, now)).unwrap();
        let id = store
            .append(new_record(BackupKind::Manual, now - Duration::hours(2)))
            .unwrap();

        assert_eq!(store.get(id).unwrap().unwrap().created_at, now);
    }

    #[test]
    fn test_query_today_filters_kind_and_day() {
        let store = MemoryHistoryStore::new();
        let now = Utc::now();
        let day_start = now - Duration::hours(1);

        store
            .append(new_record(BackupKind::Automatic, now - Duration::days(1)))
            .unwrap();
        store.append(new_record(BackupKind::Manual, now)).unwrap();

        assert!(!store.query_today(BackupKind::Automatic, day_start).unwrap());
        assert!(store.query_today(BackupKind::Manual, day_start).unwrap());
    }

    #[test]
    fn test_list_expired_uses_strict_cutoff() {
        let now = Utc::now();
        let cutoff = now - Duration::days(30);
        let store = MemoryHistoryStore::new();

        store.append(new_record(BackupKind::Automatic, now - Duration::days(31))).unwrap();
        store.append(new_record(BackupKind::Automatic, cutoff)).unwrap();
        store.append(new_record(BackupKind::Manual, now)).unwrap();

        let expired = store.list_expired(BackupKind::Automatic, cutoff).unwrap();
        assert_eq!(expired.len(), 1);
    }

    #[test]
    fn test_delete_and_most_recent() {
        let store = MemoryHistoryStore::new();
        let now = Utc::now();

        assert!(store.most_recent().unwrap().is_none());

        let old = store
            .append(new_record(BackupKind::Automatic, now - Duration::days(3)))
            .unwrap();
        let new = store.append(new_record(BackupKind::Manual, now)).unwrap();

        assert_eq!(store.most_recent().unwrap().unwrap().id, new);

        store.delete(new).unwrap();
        assert_eq!(store.most_recent().unwrap().unwrap().id, old);
        assert!(store.delete(new).is_err());
    }

    #[test]
    fn test_list_is_newest_first() {
        let store = MemoryHistoryStore::new();
        let now = Utc::now();
        let a = store.append(new_record(BackupKind::Manual, now - Duration::days(2))).unwrap();
        let b = store.append(new_record(BackupKind::Manual, now)).unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b, a]);
    }
}
