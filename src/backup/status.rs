//! Backup status reporting

use std::path::PathBuf;

use serde::Serialize;

use super::disk::free_space_gib;
use super::manager::BackupManager;
use crate::config::ConfigStore;
use crate::error::BackupResult;
use crate::models::{BackupCounts, BackupRecord};
use crate::storage::HistoryStore;

/// Snapshot of the backup system's state
#[derive(Debug, Clone, Serialize)]
pub struct BackupStatus {
    pub counts: BackupCounts,
    pub most_recent: Option<BackupRecord>,
    /// Free space at the backup directory, 0 if it does not exist yet
    pub free_space_gib: f64,
    pub backup_dir: PathBuf,
    pub retention_days: u32,
    pub frequency: String,
    pub encryption_enabled: bool,
}

impl BackupStatus {
    pub fn total(&self) -> usize {
        self.counts.total
    }
}

impl<H: HistoryStore, C: ConfigStore> BackupManager<H, C> {
    /// Summarize the history and the backup location
    pub fn status(&self) -> BackupResult<BackupStatus> {
        let backup_dir = self.backup_dir()?;

        Ok(BackupStatus {
            counts: self.history().counts()?,
            most_recent: self.history().most_recent()?,
            free_space_gib: free_space_gib(&backup_dir),
            retention_days: self.retention()?.retention_days(),
            frequency: self.frequency()?.to_string(),
            encryption_enabled: self.encryption_key().is_some(),
            backup_dir,
        })
    }
}
