//! Core data models for dbbackup
//!
//! History records, their kinds and IDs.

pub mod ids;
pub mod record;

pub use ids::RecordId;
pub use record::{BackupCounts, BackupKind, BackupRecord, NewBackupRecord};
