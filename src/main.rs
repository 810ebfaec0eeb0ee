use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dbbackup::backup::BackupManager;
use dbbackup::cli::{
    handle_backup, handle_config, handle_decrypt, handle_genkey, handle_list, handle_status,
    handle_verify,
};
use dbbackup::config::settings::{DATABASE_PATH, DEFAULT_DATABASE_PATH};
use dbbackup::config::{BackupPaths, ConfigStore, Settings};
use dbbackup::crypto::{BackupKey, KEY_ENV_VAR};
use dbbackup::models::BackupKind;
use dbbackup::storage::JsonHistoryStore;

#[derive(Parser)]
#[command(
    name = "dbbackup",
    version,
    about = "Encrypted, retention-managed backups for a single database file",
    long_about = "dbbackup snapshots a database file into a backup directory, \
                  encrypts it with AES-256-GCM when BACKUP_ENCRYPTION_KEY is set, \
                  and expires automatic backups past the retention window. \
                  Running without a command performs an automatic backup."
)]
struct Cli {
    /// State directory for settings, history and logs
    #[arg(long, global = true, env = "DBBACKUP_HOME", value_name = "DIR")]
    home: Option<PathBuf>,

    /// Database file to back up (overrides the database_path setting)
    #[arg(long, global = true, env = "DBBACKUP_DATABASE", value_name = "PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the automatic backup (at most once per day with daily frequency)
    Auto,

    /// Run a manual backup; manual backups never expire
    Manual,

    /// Show backup counts, the latest backup and free space
    Status,

    /// Generate a new encryption key
    Genkey,

    /// Decrypt an .enc backup next to the original
    Decrypt {
        /// Path to the encrypted backup
        path: PathBuf,
    },

    /// List recorded backups, newest first
    #[command(alias = "ls")]
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check every recorded backup against its file
    Verify,

    /// Show configuration and paths, or change a setting
    Config {
        /// Persist a setting
        #[arg(long, value_name = "KEY=VALUE")]
        set: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Auto);
    let home = cli.home.filter(|dir| !dir.as_os_str().is_empty());

    // Neither command reads settings or history
    match command {
        Commands::Genkey => return Ok(handle_genkey()?),
        Commands::Decrypt { path } => {
            if let Ok(paths) = resolve_paths(home) {
                init_logging(&paths);
            }
            return handle_decrypt(&path).context("Decryption failed");
        }
        _ => {}
    }

    let paths = resolve_paths(home)?;
    init_logging(&paths);

    let mut settings = Settings::load_or_create(&paths)?;
    let database = match cli.database.filter(|db| !db.as_os_str().is_empty()) {
        Some(db) => db,
        None => PathBuf::from(settings.get(DATABASE_PATH, DEFAULT_DATABASE_PATH)?),
    };

    match command {
        Commands::Genkey | Commands::Decrypt { .. } => {}
        Commands::Config { set } => {
            handle_config(&paths, &mut settings, &database, set.as_deref())?;
        }
        command => {
            let history = JsonHistoryStore::open(paths.history_file())?;
            let manager =
                BackupManager::new(history, settings, database).with_encryption_key(resolve_key());

            match command {
                Commands::Auto => handle_backup(&manager, BackupKind::Automatic)
                    .context("Automatic backup failed")?,
                Commands::Manual => {
                    handle_backup(&manager, BackupKind::Manual).context("Manual backup failed")?
                }
                Commands::Status => handle_status(&manager).context("Could not read status")?,
                Commands::List { verbose } => handle_list(&manager, verbose)?,
                Commands::Verify => handle_verify(&manager)?,
                Commands::Genkey | Commands::Decrypt { .. } | Commands::Config { .. } => {}
            }
        }
    }

    Ok(())
}

fn resolve_paths(home: Option<PathBuf>) -> Result<BackupPaths> {
    Ok(match home {
        Some(dir) => BackupPaths::with_base_dir(dir),
        None => BackupPaths::new()?,
    })
}

/// Key for new backups; a malformed key disables encryption rather than failing
fn resolve_key() -> Option<BackupKey> {
    match BackupKey::from_env() {
        Ok(key) => key,
        Err(e) => {
            tracing::error!(error = %e, "ignoring invalid {}", KEY_ENV_VAR);
            println!("Warning: {} is invalid ({}), encryption disabled", KEY_ENV_VAR, e);
            None
        }
    }
}

/// Log to `<home>/logs/backup.log`, or stderr if the file cannot be opened
fn init_logging(paths: &BackupPaths) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "dbbackup=info".into());

    let log_file = fs::create_dir_all(paths.log_dir()).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths.log_file())
    });

    match log_file {
        Ok(file) => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init(),
        Err(_) => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
