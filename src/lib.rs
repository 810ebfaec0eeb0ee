//! dbbackup - encrypted, retention-managed backups of a single database file
//!
//! This library snapshots a database file into a backup directory, seals it
//! with AES-256-GCM when a key is configured, records every stored artifact
//! in a durable history and expires old automatic backups.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: State directory resolution and the settings store
//! - `error`: Custom error types
//! - `models`: Backup records and counts
//! - `storage`: History store contract and JSON/in-memory implementations
//! - `crypto`: Key handling, envelope codec and SHA-256 digests
//! - `backup`: Orchestration, retention, status and verification
//! - `cli`: Command handlers for the `dbbackup` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use dbbackup::backup::BackupManager;
//! use dbbackup::config::{BackupPaths, Settings};
//! use dbbackup::storage::JsonHistoryStore;
//!
//! let paths = BackupPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let history = JsonHistoryStore::open(paths.history_file())?;
//! let manager = BackupManager::new(history, settings, "instance/app.db");
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod storage;

pub use error::{BackupError, BackupResult};
