//! Backup settings and the config store contract
//!
//! Settings are string-keyed with per-read defaults, so a missing settings
//! file or key simply yields the default. The backup core only reads settings
//! through [`ConfigStore`]; [`Settings`] is the JSON-file implementation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::paths::BackupPaths;
use crate::error::{BackupError, BackupResult};
use crate::storage::file_io::{read_json, write_json_atomic};

/// How often backups are expected to run
pub const BACKUP_FREQUENCY: &str = "backup_frequency";
/// Directory backups are written to
pub const BACKUP_LOCATION: &str = "backup_location";
/// Retention window for automatic backups, in days
pub const BACKUP_RETENTION: &str = "backup_retention";
/// Source database file
pub const DATABASE_PATH: &str = "database_path";

pub const DEFAULT_FREQUENCY: &str = "daily";
pub const DEFAULT_LOCATION: &str = "backups/";
pub const DEFAULT_RETENTION: &str = "30";
pub const DEFAULT_DATABASE_PATH: &str = "instance/app.db";

/// Keys `config --set` accepts
pub const KNOWN_KEYS: [&str; 4] = [
    BACKUP_FREQUENCY,
    BACKUP_LOCATION,
    BACKUP_RETENTION,
    DATABASE_PATH,
];

/// Read access to key/value settings
pub trait ConfigStore {
    /// Get a setting, or `default` when it is not set
    fn get(&self, key: &str, default: &str) -> BackupResult<String>;
}

impl<T: ConfigStore + ?Sized> ConfigStore for &T {
    fn get(&self, key: &str, default: &str) -> BackupResult<String> {
        (**self).get(key, default)
    }
}

impl ConfigStore for HashMap<String, String> {
    fn get(&self, key: &str, default: &str) -> BackupResult<String> {
        Ok(HashMap::get(self, key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }
}

/// Backup frequency preference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupFrequency {
    Daily,
    Weekly,
    Monthly,
    /// Any other value; never gates automatic runs
    Unrecognized(String),
}

impl BackupFrequency {
    /// Parse a frequency setting
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            _ => Self::Unrecognized(s.to_string()),
        }
    }

    /// Whether at most one automatic backup per calendar day is allowed
    pub fn is_daily(&self) -> bool {
        matches!(self, Self::Daily)
    }
}

impl fmt::Display for BackupFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

/// Persistent settings for dbbackup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Raw setting values by key
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            values: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or default settings if the file doesn't exist
    pub fn load_or_create(paths: &BackupPaths) -> Result<Self, BackupError> {
        let settings: Settings = read_json(paths.settings_file()).map_err(|e| {
            BackupError::Config(format!("Failed to load settings: {}", e))
        })?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BackupPaths) -> Result<(), BackupError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Set a known key
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), BackupError> {
        if !KNOWN_KEYS.contains(&key) {
            return Err(BackupError::InvalidInput(format!(
                "Unknown setting '{}' (expected one of: {})",
                key,
                KNOWN_KEYS.join(", ")
            )));
        }

        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl ConfigStore for Settings {
    fn get(&self, key: &str, default: &str) -> BackupResult<String> {
        Ok(self
            .values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }
}
