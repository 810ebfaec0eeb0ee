//! Read-only audit of the backup history against the files on disk
//!
//! Every record is checked by recomputing the plaintext digest. Encrypted
//! artifacts are decrypted in memory, never written back out. Nothing is
//! repaired; orphaned records are only reported.

use std::fmt;

use serde::Serialize;

use super::manager::BackupManager;
use crate::config::ConfigStore;
use crate::crypto::{self, BackupKey};
use crate::error::BackupResult;
use crate::models::BackupRecord;
use crate::storage::HistoryStore;

/// Health of a single history record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordHealth {
    /// File present and the plaintext digest matches
    Ok,
    /// The record points to a file that no longer exists
    Missing,
    /// Content decodes but hashes to something else
    ChecksumMismatch { actual: String },
    /// Decryption failed or the file could not be read
    IntegrityFailure { reason: String },
    /// Encrypted artifact and no key available to check it
    Unverified,
}

impl RecordHealth {
    /// Whether this state is acceptable in a healthy history
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Ok | Self::Unverified)
    }
}

impl fmt::Display for RecordHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Missing => write!(f, "missing"),
            Self::ChecksumMismatch { .. } => write!(f, "checksum mismatch"),
            Self::IntegrityFailure { reason } => write!(f, "integrity failure ({})", reason),
            Self::Unverified => write!(f, "unverified (no key)"),
        }
    }
}

/// Result of checking one record
#[derive(Debug, Clone, Serialize)]
pub struct RecordCheck {
    pub record: BackupRecord,
    pub health: RecordHealth,
}

/// Result of checking every record in the history
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub checks: Vec<RecordCheck>,
}

impl VerifyReport {
    /// True when no record is missing, mismatched or corrupt
    pub fn is_healthy(&self) -> bool {
        self.checks.iter().all(|c| c.health.is_healthy())
    }

    /// Checks that need attention
    pub fn problems(&self) -> impl Iterator<Item = &RecordCheck> {
        self.checks.iter().filter(|c| !c.health.is_healthy())
    }

    pub fn count_ok(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.health == RecordHealth::Ok)
            .count()
    }
}

impl<H: HistoryStore, C: ConfigStore> BackupManager<H, C> {
    /// Check every history record, newest first
    pub fn verify(&self) -> BackupResult<VerifyReport> {
        let records = self.history().list()?;
        let mut report = VerifyReport::default();

        for record in records {
            let health = check_record(&record, self.encryption_key());
            if !health.is_healthy() {
                tracing::warn!(filename = %record.filename, health = %health, "backup failed verification");
            }
            report.checks.push(RecordCheck { record, health });
        }

        tracing::info!(
            checked = report.checks.len(),
            ok = report.count_ok(),
            "verification finished"
        );
        Ok(report)
    }
}

fn check_record(record: &BackupRecord, key: Option<&BackupKey>) -> RecordHealth {
    if !record.file_path.is_file() {
        return RecordHealth::Missing;
    }

    let actual = if record.encrypted {
        let Some(key) = key else {
            return RecordHealth::Unverified;
        };
        match crypto::decrypt_to_vec(&record.file_path, key) {
            Ok(plaintext) => crypto::digest_bytes(&plaintext),
            Err(e) => {
                return RecordHealth::IntegrityFailure {
                    reason: e.to_string(),
                }
            }
        }
    } else {
        match crypto::digest(&record.file_path) {
            Ok(digest) => digest,
            Err(e) => {
                return RecordHealth::IntegrityFailure {
                    reason: e.to_string(),
                }
            }
        }
    };

    if actual.eq_ignore_ascii_case(&record.checksum) {
        RecordHealth::Ok
    } else {
        RecordHealth::ChecksumMismatch { actual }
    }
}
