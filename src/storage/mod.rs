//! Storage layer for dbbackup
//!
//! Defines the history store contract the backup core depends on, plus a
//! durable JSON implementation and an in-memory one.

pub mod file_io;
pub mod history;
pub mod memory;

pub use file_io::{read_json, write_bytes_atomic, write_json_atomic};
pub use history::JsonHistoryStore;
pub use memory::MemoryHistoryStore;

use chrono::{DateTime, Utc};

use crate::error::BackupError;
use crate::models::{BackupCounts, BackupKind, BackupRecord, NewBackupRecord, RecordId};

/// Append/query access to the backup history
///
/// Mutations must be durable before they return.
pub trait HistoryStore {
    /// Persist a new record and return its store-assigned ID
    fn append(&self, record: NewBackupRecord) -> Result<RecordId, BackupError>;

    /// Look up a single record
    fn get(&self, id: RecordId) -> Result<Option<BackupRecord>, BackupError>;

    /// Whether a record of `kind` exists at or after `day_start`
    fn query_today(&self, kind: BackupKind, day_start: DateTime<Utc>)
        -> Result<bool, BackupError>;

    /// Records of `kind` created strictly before `cutoff`
    fn list_expired(
        &self,
        kind: BackupKind,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<BackupRecord>, BackupError>;

    /// The newest record of any kind
    fn most_recent(&self) -> Result<Option<BackupRecord>, BackupError>;

    fn counts(&self) -> Result<BackupCounts, BackupError>;

    /// Remove a record; an unknown ID is an error
    fn delete(&self, id: RecordId) -> Result<(), BackupError>;

    /// All records, newest first
    fn list(&self) -> Result<Vec<BackupRecord>, BackupError>;
}

impl<T: HistoryStore + ?Sized> HistoryStore for &T {
    fn append(&self, record: NewBackupRecord) -> Result<RecordId, BackupError> {
        (**self).append(record)
    }

    fn get(&self, id: RecordId) -> Result<Option<BackupRecord>, BackupError> {
        (**self).get(id)
    }

    fn query_today(
        &self,
        kind: BackupKind,
        day_start: DateTime<Utc>,
    ) -> Result<bool, BackupError> {
        (**self).query_today(kind, day_start)
    }

    fn list_expired(
        &self,
        kind: BackupKind,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<BackupRecord>, BackupError> {
        (**self).list_expired(kind, cutoff)
    }

    fn most_recent(&self) -> Result<Option<BackupRecord>, BackupError> {
        (**self).most_recent()
    }

    fn counts(&self) -> Result<BackupCounts, BackupError> {
        (**self).counts()
    }

    fn delete(&self, id: RecordId) -> Result<(), BackupError> {
        (**self).delete(id)
    }

    fn list(&self) -> Result<Vec<BackupRecord>, BackupError> {
        (**self).list()
    }
}
