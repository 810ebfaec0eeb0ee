//! Backup history record model
//!
//! One record exists per backup attempt that produced a file on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::ids::RecordId;

/// How a backup was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    /// Scheduled run, subject to the daily gate and retention
    Automatic,
    /// Operator-triggered run, never expired automatically
    Manual,
}

impl BackupKind {
    /// Short label used in snapshot filenames
    pub fn file_label(&self) -> &'static str {
        match self {
            Self::Automatic => "auto",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A record about to be appended; the store assigns its ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBackupRecord {
    pub filename: String,
    pub kind: BackupKind,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub file_path: PathBuf,
    pub checksum: String,
    pub encrypted: bool,
}

impl NewBackupRecord {
    /// Attach a store-assigned ID
    pub fn with_id(self, id: RecordId) -> BackupRecord {
        BackupRecord {
            id,
            filename: self.filename,
            kind: self.kind,
            size_bytes: self.size_bytes,
            created_at: self.created_at,
            file_path: self.file_path,
            checksum: self.checksum,
            encrypted: self.encrypted,
        }
    }
}

/// A persisted backup history record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: RecordId,

    /// Final on-disk name, including `.enc` when encrypted
    pub filename: String,

    pub kind: BackupKind,

    /// Size of the stored artifact (post-encryption if applicable)
    pub size_bytes: u64,

    pub created_at: DateTime<Utc>,

    pub file_path: PathBuf,

    /// Hex SHA-256 of the plaintext snapshot, taken before encryption
    pub checksum: String,

    #[serde(default)]
    pub encrypted: bool,
}

impl BackupRecord {
    /// Age of the record relative to `now`
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.created_at)
    }
}

/// Aggregate record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupCounts {
    pub total: usize,
    pub automatic: usize,
    pub manual: usize,
}

impl BackupCounts {
    /// Tally a set of records
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a BackupRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.total += 1;
            match record.kind {
                BackupKind::Automatic => counts.automatic += 1,
                BackupKind::Manual => counts.manual += 1,
            }
        }
        counts
    }

    /// Count for a single kind
    pub fn of_kind(&self, kind: BackupKind) -> usize {
        match kind {
            BackupKind::Automatic => self.automatic,
            BackupKind::Manual => self.manual,
        }
    }
}
