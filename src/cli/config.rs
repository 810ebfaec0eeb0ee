//! Configuration CLI command

use std::path::Path;

use crate::config::settings::{
    BACKUP_FREQUENCY, BACKUP_LOCATION, BACKUP_RETENTION, DATABASE_PATH, DEFAULT_DATABASE_PATH,
    DEFAULT_FREQUENCY, DEFAULT_LOCATION, DEFAULT_RETENTION,
};
use crate::config::{BackupPaths, ConfigStore, Settings};
use crate::crypto::{BackupKey, KEY_ENV_VAR};
use crate::error::{BackupError, BackupResult};

/// Show resolved paths and settings, or persist `key=value`
pub fn handle_config(
    paths: &BackupPaths,
    settings: &mut Settings,
    database: &Path,
    set: Option<&str>,
) -> BackupResult<()> {
    if let Some(assignment) = set {
        let (key, value) = parse_assignment(assignment)?;
        settings.set(key, value)?;
        settings.save(paths)?;
        tracing::info!(key, value, "setting updated");
        println!("Set {} = {}", key, value);
        return Ok(());
    }

    let key_state = match BackupKey::from_env() {
        Ok(Some(_)) => "configured",
        Ok(None) => "not configured",
        Err(_) => "invalid",
    };

    println!("dbbackup Configuration");
    println!("======================");
    println!("State directory:  {}", paths.base_dir().display());
    println!("Settings file:    {}", paths.settings_file().display());
    println!("History file:     {}", paths.history_file().display());
    println!("Log file:         {}", paths.log_file().display());
    println!("Database:         {}", database.display());
    println!("{}: {}", KEY_ENV_VAR, key_state);
    println!();
    println!("Settings:");
    for (key, default) in [
        (BACKUP_FREQUENCY, DEFAULT_FREQUENCY),
        (BACKUP_LOCATION, DEFAULT_LOCATION),
        (BACKUP_RETENTION, DEFAULT_RETENTION),
        (DATABASE_PATH, DEFAULT_DATABASE_PATH),
    ] {
        println!("  {:<17} {}", key, settings.get(key, default)?);
    }

    Ok(())
}

fn parse_assignment(assignment: &str) -> BackupResult<(&str, &str)> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(BackupError::InvalidInput(format!(
            "Expected key=value, got '{}'",
            assignment
        ))),
    }
}
