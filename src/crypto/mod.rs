//! Cryptographic functions for dbbackup
//!
//! AES-256-GCM envelopes for backup artifacts and SHA-256 digests for
//! auditing the plaintext snapshot.

pub mod checksum;
pub mod encryption;
pub mod key;

pub use checksum::{digest, digest_bytes};
pub use encryption::{
    decrypt_file, decrypt_to_vec, encrypt_file, open, seal, ENCRYPTED_SUFFIX, NONCE_SIZE,
};
pub use key::{BackupKey, KEY_ENV_VAR, KEY_SIZE};
