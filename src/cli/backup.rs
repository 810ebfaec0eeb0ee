//! Backup CLI commands
//!
//! Implements the commands that create, list, report on and verify backups.

use chrono::Utc;

use crate::backup::{BackupManager, BackupOutcome};
use crate::config::ConfigStore;
use crate::error::{BackupError, BackupResult};
use crate::models::BackupKind;
use crate::storage::HistoryStore;

/// Run an automatic or manual backup and report what happened
pub fn handle_backup<H: HistoryStore, C: ConfigStore>(
    manager: &BackupManager<H, C>,
    kind: BackupKind,
) -> BackupResult<()> {
    match manager.run_backup(kind)? {
        BackupOutcome::Skipped => {
            println!("Backup skipped: automatic backup already completed today");
        }
        BackupOutcome::Completed(done) => {
            let label = match kind {
                BackupKind::Automatic => "Automatic",
                BackupKind::Manual => "Manual",
            };
            println!(
                "{} backup completed: {} ({})",
                label,
                done.record.filename,
                format_size(done.record.size_bytes)
            );

            for warning in &done.warnings {
                println!("Warning: {}", warning);
            }

            if !done.sweep.removed.is_empty() {
                println!(
                    "Removed {} expired backup(s)",
                    done.sweep.removed.len()
                );
            }
            for failure in &done.sweep.failures {
                println!("Warning: {}", failure);
            }
        }
    }

    Ok(())
}

/// Print counts, the latest backup and free space
pub fn handle_status<H: HistoryStore, C: ConfigStore>(
    manager: &BackupManager<H, C>,
) -> BackupResult<()> {
    let status = manager.status()?;

    let last = match &status.most_recent {
        Some(record) => format!(
            "{} ({})",
            record.filename,
            record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => "none".to_string(),
    };

    println!("Backup Status");
    println!("=============");
    println!("Total backups:     {}", status.counts.total);
    println!("Automatic backups: {}", status.counts.automatic);
    println!("Manual backups:    {}", status.counts.manual);
    println!("Last backup:       {}", last);
    println!("Free space:        {:.2} GiB", status.free_space_gib);
    println!("Backup directory:  {}", status.backup_dir.display());
    println!("Retention:         {} days", status.retention_days);
    println!("Frequency:         {}", status.frequency);
    println!(
        "Encryption:        {}",
        if status.encryption_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    Ok(())
}

/// List history records, newest first
pub fn handle_list<H: HistoryStore, C: ConfigStore>(
    manager: &BackupManager<H, C>,
    verbose: bool,
) -> BackupResult<()> {
    let records = manager.history().list()?;

    if records.is_empty() {
        println!("No backups found.");
        println!("Create one with: dbbackup manual");
        return Ok(());
    }

    println!("Backups");
    println!("=======");
    println!();

    let now = Utc::now();
    for (i, record) in records.iter().enumerate() {
        let age_str = format_duration(record.age(now));
        let lock = if record.encrypted { " [encrypted]" } else { "" };

        if verbose {
            println!(
                "{}. {}{}\n   ID: {}\n   Kind: {}\n   Created: {}\n   Size: {}\n   Age: {}\n   Path: {}\n   SHA-256: {}\n",
                i + 1,
                record.filename,
                lock,
                record.id,
                record.kind,
                record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                format_size(record.size_bytes),
                age_str,
                record.file_path.display(),
                record.checksum,
            );
        } else {
            println!(
                "  {}. {} ({}, {} ago, {}){}",
                i + 1,
                record.filename,
                record.kind,
                age_str,
                format_size(record.size_bytes),
                lock,
            );
        }
    }

    println!();
    println!("Total: {} backup(s)", records.len());

    Ok(())
}

/// Check every record against its file; fails if any needs attention
pub fn handle_verify<H: HistoryStore, C: ConfigStore>(
    manager: &BackupManager<H, C>,
) -> BackupResult<()> {
    let report = manager.verify()?;

    if report.checks.is_empty() {
        println!("No backups to verify.");
        return Ok(());
    }

    for check in &report.checks {
        println!("  {}: {}", check.record.filename, check.health);
    }
    println!();

    let problems = report.problems().count();
    println!(
        "Verified {} backup(s): {} ok, {} with problems",
        report.checks.len(),
        report.count_ok(),
        problems
    );

    if problems > 0 {
        return Err(BackupError::Integrity(format!(
            "{} backup(s) failed verification",
            problems
        )));
    }

    Ok(())
}

/// Format a duration in human-readable form
fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    let months = days / 30;
    format!("{}mo", months)
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
