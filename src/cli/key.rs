//! Key management CLI commands

use std::path::Path;

use crate::crypto::{self, BackupKey, KEY_ENV_VAR};
use crate::error::{BackupError, BackupResult};

/// Print a fresh AES-256 key in the form expected by the environment
pub fn handle_genkey() -> BackupResult<()> {
    let key = BackupKey::generate();

    println!("New AES-256 key generated:");
    println!("{}={}", KEY_ENV_VAR, key.to_hex());
    println!();
    println!("Add this line to your environment (e.g. a .env file).");
    println!("Backups encrypted with a lost key cannot be recovered.");

    Ok(())
}

/// Decrypt an `.enc` backup next to itself using the configured key
pub fn handle_decrypt(path: &Path) -> BackupResult<()> {
    let key = BackupKey::from_env()?.ok_or_else(|| {
        BackupError::Config(format!("{} not configured", KEY_ENV_VAR))
    })?;

    let decrypted = crypto::decrypt_file(path, &key)?;
    println!("Backup decrypted: {}", decrypted.display());

    Ok(())
}
