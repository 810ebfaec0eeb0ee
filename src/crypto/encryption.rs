//! AES-256-GCM file encryption
//!
//! Encrypted backups use a bare envelope: `nonce (12 bytes) || ciphertext`,
//! where the ciphertext carries the 16-byte GCM tag. There is no header or
//! length field; the nonce is read as a fixed-size prefix.

use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use zeroize::Zeroizing;

use crate::error::{BackupError, BackupResult};
use crate::storage::file_io::{with_suffix, write_bytes_atomic};

use super::BackupKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Suffix appended to encrypted artifacts
pub const ENCRYPTED_SUFFIX: &str = ".enc";

/// Path an encrypted artifact is written to
pub fn encrypted_path_for(path: &Path) -> PathBuf {
    with_suffix(path, ENCRYPTED_SUFFIX)
}

/// Path a decrypted artifact is written to (the `.enc` suffix stripped)
pub fn decrypted_path_for(path: &Path) -> BackupResult<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BackupError::InvalidInput(format!("Not a file path: {}", path.display())))?;

    match name.strip_suffix(ENCRYPTED_SUFFIX) {
        Some(stem) if !stem.is_empty() => Ok(path.with_file_name(stem)),
        _ => Err(BackupError::InvalidInput(format!(
            "{} does not end in {}",
            path.display(),
            ENCRYPTED_SUFFIX
        ))),
    }
}

/// Encrypt a buffer into an envelope with a fresh random nonce
pub fn seal(plaintext: &[u8], key: &BackupKey) -> BackupResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| BackupError::Config(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| BackupError::Io(format!("Encryption failed: {}", e)))?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Authenticate and decrypt an envelope
///
/// Any authentication failure is an integrity error; no plaintext is
/// returned for tampered or truncated input.
pub fn open(envelope: &[u8], key: &BackupKey) -> BackupResult<Zeroizing<Vec<u8>>> {
    if envelope.len() < NONCE_SIZE + TAG_SIZE {
        return Err(BackupError::Integrity(format!(
            "envelope is {} bytes, shorter than nonce and tag ({} bytes)",
            envelope.len(),
            NONCE_SIZE + TAG_SIZE
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| BackupError::Config(format!("Failed to create cipher: {}", e)))?;

    let (nonce_bytes, ciphertext) = envelope.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher.decrypt(nonce, ciphertext).map(Zeroizing::new).map_err(|_| {
        BackupError::Integrity("authentication failed: wrong key or corrupted data".to_string())
    })
}

/// Encrypt a file in place
///
/// Writes the envelope to `<path>.enc` and removes the plaintext. Returns the
/// encrypted path.
pub fn encrypt_file(path: &Path, key: &BackupKey) -> BackupResult<PathBuf> {
    let plaintext = Zeroizing::new(fs::read(path).map_err(|e| {
        BackupError::Io(format!("Failed to read {}: {}", path.display(), e))
    })?);

    let envelope = seal(&plaintext, key)?;
    let encrypted_path = encrypted_path_for(path);
    write_bytes_atomic(&encrypted_path, &envelope)?;

    if let Err(e) = fs::remove_file(path) {
        let _ = fs::remove_file(&encrypted_path);
        return Err(BackupError::Io(format!(
            "Failed to remove plaintext {}: {}",
            path.display(),
            e
        )));
    }

    tracing::debug!(path = %encrypted_path.display(), "backup encrypted");
    Ok(encrypted_path)
}

/// Decrypt an envelope into memory without writing anything to disk
pub fn decrypt_to_vec(path: &Path, key: &BackupKey) -> BackupResult<Zeroizing<Vec<u8>>> {
    let envelope = fs::read(path)
        .map_err(|e| BackupError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    open(&envelope, key)
}

/// Decrypt a file next to itself
///
/// Writes the plaintext to the path with `.enc` stripped and returns it. The
/// encrypted file is left in place.
pub fn decrypt_file(path: &Path, key: &BackupKey) -> BackupResult<PathBuf> {
    let decrypted_path = decrypted_path_for(path)?;
    let plaintext = decrypt_to_vec(path, key)?;
    write_bytes_atomic(&decrypted_path, &plaintext)?;

    tracing::info!(path = %decrypted_path.display(), "backup decrypted");
    Ok(decrypted_path)
}
