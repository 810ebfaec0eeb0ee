//! Retention policy for automatic backups
//!
//! An automatic backup expires once it is strictly older than the retention
//! window. Manual backups never expire; they stay until removed by hand.

use chrono::{DateTime, Duration, Utc};

use crate::models::{BackupKind, BackupRecord};

/// Retention window used when the setting is missing or unusable
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Decides which backups are past the retention window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    retention_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_DAYS)
    }
}

impl RetentionPolicy {
    pub fn new(retention_days: u32) -> Self {
        Self { retention_days }
    }

    /// Parse the `backup_retention` setting, falling back to 30 days
    pub fn from_config_value(raw: &str) -> Self {
        match raw.trim().parse::<u32>() {
            Ok(days) => Self::new(days),
            Err(_) => {
                tracing::warn!(
                    value = raw,
                    default = DEFAULT_RETENTION_DAYS,
                    "invalid backup_retention setting, using default"
                );
                Self::default()
            }
        }
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Records created before this instant are past the window
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(Duration::days(i64::from(self.retention_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn is_expired(&self, record: &BackupRecord, now: DateTime<Utc>) -> bool {
        record.kind == BackupKind::Automatic && record.created_at < self.cutoff(now)
    }

    /// The subset of `records` that has expired
    pub fn expired(&self, records: &[BackupRecord], now: DateTime<Utc>) -> Vec<BackupRecord> {
        records
            .iter()
            .filter(|r| self.is_expired(r, now))
            .cloned()
            .collect()
    }
}

/// Expired records for a retention window of `retention_days`
pub fn expired(
    records: &[BackupRecord],
    retention_days: u32,
    now: DateTime<Utc>,
) -> Vec<BackupRecord> {
    RetentionPolicy::new(retention_days).expired(records, now)
}
