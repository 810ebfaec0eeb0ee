//! 256-bit backup encryption key
//!
//! The key is never stored by dbbackup. It is supplied per invocation through
//! the `BACKUP_ENCRYPTION_KEY` environment variable as 64 hex characters.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{BackupError, BackupResult};

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Environment variable holding the hex-encoded key
pub const KEY_ENV_VAR: &str = "BACKUP_ENCRYPTION_KEY";

/// A 32-byte encryption key, zeroed on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct BackupKey {
    bytes: [u8; KEY_SIZE],
}

impl BackupKey {
    /// Build a key from raw bytes
    ///
    /// Anything other than exactly 32 bytes is a configuration error.
    pub fn from_bytes(bytes: &[u8]) -> BackupResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(BackupError::Config(format!(
                "encryption key must be {} bytes ({} hex characters), got {} bytes",
                KEY_SIZE,
                KEY_SIZE * 2,
                bytes.len()
            )));
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { bytes: key })
    }

    /// Parse a hex-encoded key
    pub fn from_hex(encoded: &str) -> BackupResult<Self> {
        let bytes = Zeroizing::new(hex::decode(encoded.trim()).map_err(|e| {
            BackupError::Config(format!("{} is not valid hex: {}", KEY_ENV_VAR, e))
        })?);
        Self::from_bytes(&bytes)
    }

    /// Read the key from `BACKUP_ENCRYPTION_KEY`
    ///
    /// Returns `Ok(None)` when the variable is unset or empty, and a
    /// configuration error when it is set but malformed.
    pub fn from_env() -> BackupResult<Option<Self>> {
        Self::from_env_var(KEY_ENV_VAR)
    }

    /// Read the key from an arbitrary environment variable
    pub fn from_env_var(name: &str) -> BackupResult<Option<Self>> {
        match std::env::var(name) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Self::from_hex(&value).map(Some),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(BackupError::Config(format!(
                "{} contains non-UTF-8 data",
                name
            ))),
        }
    }

    /// Generate a fresh random key from the OS RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Hex form for display during initial setup
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl fmt::Debug for BackupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BackupKey([redacted])")
    }
}
