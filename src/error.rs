//! Custom error types for dbbackup
//!
//! A single error enum covers every failure the backup core can report.
//! Callers tell fatal attempt errors apart from per-record sweep failures by
//! where they show up: the former come back as `Err`, the latter are collected
//! as [`BackupError::Cleanup`] values in a sweep report.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for dbbackup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Bad or missing key, unusable configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source database file does not exist
    #[error("Source database not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// Authenticated decryption failed (tampered data, corruption or wrong key)
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// History or config backend unavailable
    #[error("Store error: {0}")]
    Store(String),

    /// A single expired record could not be removed during the retention sweep
    #[error("Cleanup error for {filename}: {reason}")]
    Cleanup { filename: String, reason: String },

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Arguments that cannot be acted on
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BackupError {
    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is an integrity error
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }

    /// Check if the source database was missing
    pub fn is_source_missing(&self) -> bool {
        matches!(self, Self::SourceMissing(_))
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for dbbackup operations
pub type BackupResult<T> = Result<T, BackupError>;
