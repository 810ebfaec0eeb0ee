//! Configuration module for dbbackup
//!
//! This module provides configuration management including:
//! - State directory resolution
//! - The key/value settings store read by the backup core

pub mod paths;
pub mod settings;

pub use paths::BackupPaths;
pub use settings::{BackupFrequency, ConfigStore, Settings};
