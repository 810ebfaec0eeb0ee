//! Path management for dbbackup
//!
//! Resolves where dbbackup keeps its own state: settings, backup history and
//! the operational log. Backups themselves go to the configured
//! `backup_location`, which is independent of this directory.
//!
//! ## Path Resolution Order
//!
//! 1. `DBBACKUP_HOME` environment variable (if set)
//! 2. Unix: `$XDG_DATA_HOME/dbbackup` or `~/.local/share/dbbackup`
//! 3. Windows: `%APPDATA%\dbbackup`

use std::path::{Path, PathBuf};

use crate::error::BackupError;

/// Environment variable overriding the state directory
pub const HOME_ENV_VAR: &str = "DBBACKUP_HOME";

/// Manages all paths used by dbbackup
#[derive(Debug, Clone)]
pub struct BackupPaths {
    base_dir: PathBuf,
}

impl BackupPaths {
    /// Resolve the state directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, BackupError> {
        let base_dir = match std::env::var(HOME_ENV_VAR) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create BackupPaths with a custom base directory
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Settings file (the config store)
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Backup history file (the history store)
    pub fn history_file(&self) -> PathBuf {
        self.base_dir.join("history.json")
    }

    /// Directory for the operational log
    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Operational log file
    pub fn log_file(&self) -> PathBuf {
        self.log_dir().join("backup.log")
    }

    /// Ensure the state and log directories exist
    pub fn ensure_directories(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BackupError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.log_dir())
            .map_err(|e| BackupError::Io(format!("Failed to create log directory: {}", e)))?;

        Ok(())
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, BackupError> {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        if !data_home.is_empty() {
            return Ok(PathBuf::from(data_home).join("dbbackup"));
        }
    }

    let home = std::env::var("HOME")
        .map_err(|_| BackupError::Config("HOME environment variable not set".into()))?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("dbbackup"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, BackupError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| BackupError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("dbbackup"))
}
