//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup core.

pub mod backup;
pub mod config;
pub mod key;

pub use backup::{handle_backup, handle_list, handle_status, handle_verify};
pub use config::handle_config;
pub use key::{handle_decrypt, handle_genkey};
