//! Backup system for dbbackup
//!
//! Snapshots a single database file into a backup directory, optionally
//! sealing it with AES-256-GCM, and records every stored artifact in the
//! history store.
//!
//! # Architecture
//!
//! - `BackupManager`: runs a backup attempt and the retention sweep, reports
//!   status and verifies stored artifacts
//! - `RetentionPolicy`: decides which automatic backups have expired
//!
//! # Backup Files
//!
//! Snapshots are named `backup_<auto|manual>_<YYYYMMDD_HHMMSS>.db`. When a key
//! is configured the stored artifact is `<name>.db.enc` and the plaintext copy
//! is removed.
//!
//! # Retention Policy
//!
//! Automatic backups older than `backup_retention` days (default 30) are
//! deleted after each successful backup. Manual backups are never deleted.
//!
//! # Example
//!
//! ```rust,ignore
//! use dbbackup::backup::BackupManager;
//! use dbbackup::models::BackupKind;
//!
//! let manager = BackupManager::new(history, settings, "instance/app.db")
//!     .with_encryption_key(BackupKey::from_env()?);
//! let outcome = manager.run_backup(BackupKind::Manual)?;
//! ```

pub mod disk;
pub mod manager;
pub mod retention;
pub mod status;
pub mod verify;

pub use manager::{
    snapshot_filename, BackupManager, BackupOutcome, CompletedBackup, SweepReport,
    UNENCRYPTED_WARNING,
};
pub use retention::{RetentionPolicy, DEFAULT_RETENTION_DAYS};
pub use status::BackupStatus;
pub use verify::{RecordCheck, RecordHealth, VerifyReport};
