//! SHA-256 content digests for integrity auditing
//!
//! Digests are lowercase hex. They fingerprint the plaintext snapshot and are
//! not used as lookup keys.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{BackupError, BackupResult};

/// Digest the full contents of a file, streaming
pub fn digest(path: &Path) -> BackupResult<String> {
    let file = File::open(path)
        .map_err(|e| BackupError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)
        .map_err(|e| BackupError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

    Ok(hex::encode(hasher.finalize()))
}

/// Digest an in-memory buffer
pub fn digest_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
