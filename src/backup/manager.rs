//! Backup manager for dbbackup
//!
//! Runs one backup attempt end to end: daily gate, snapshot, plaintext
//! digest, optional encryption, history append and the retention sweep.
//! Config and history are injected at construction so tests can swap in
//! in-memory stores.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};

use super::retention::RetentionPolicy;
use crate::config::settings::{
    BACKUP_FREQUENCY, BACKUP_LOCATION, BACKUP_RETENTION, DEFAULT_FREQUENCY, DEFAULT_LOCATION,
    DEFAULT_RETENTION,
};
use crate::config::{BackupFrequency, ConfigStore};
use crate::crypto::encryption::encrypted_path_for;
use crate::crypto::{self, BackupKey, ENCRYPTED_SUFFIX};
use crate::error::{BackupError, BackupResult};
use crate::models::{BackupKind, BackupRecord, NewBackupRecord};
use crate::storage::HistoryStore;

/// Warning surfaced when a backup is kept in plaintext
pub const UNENCRYPTED_WARNING: &str =
    "BACKUP_ENCRYPTION_KEY not configured, backup stored unencrypted";

/// Result of a successful backup attempt
#[derive(Debug)]
pub enum BackupOutcome {
    /// An automatic backup already exists for today
    Skipped,
    /// A new backup was written and recorded
    Completed(CompletedBackup),
}

impl BackupOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// The record written by this attempt, if any
    pub fn record(&self) -> Option<&BackupRecord> {
        match self {
            Self::Skipped => None,
            Self::Completed(done) => Some(&done.record),
        }
    }
}

/// Details of a completed backup
#[derive(Debug)]
pub struct CompletedBackup {
    pub record: BackupRecord,
    /// Non-fatal conditions the caller should see (e.g. no encryption key)
    pub warnings: Vec<String>,
    pub sweep: SweepReport,
}

/// What the retention sweep did
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Records whose file and history entry were both removed
    pub removed: Vec<BackupRecord>,
    /// Per-record failures; none of them fail the backup
    pub failures: Vec<BackupError>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Snapshot filename: `backup_<auto|manual>_<YYYYMMDD_HHMMSS>.db` in local time
pub fn snapshot_filename(kind: BackupKind, at: DateTime<Utc>) -> String {
    format!(
        "backup_{}_{}.db",
        kind.file_label(),
        at.with_timezone(&Local).format("%Y%m%d_%H%M%S")
    )
}

/// Coordinates backup creation and retention
pub struct BackupManager<H, C> {
    history: H,
    config: C,
    /// The single database file being backed up
    database_path: PathBuf,
    key: Option<BackupKey>,
}

impl<H: HistoryStore, C: ConfigStore> BackupManager<H, C> {
    /// Create a manager that writes plaintext backups until a key is supplied
    pub fn new(history: H, config: C, database_path: impl Into<PathBuf>) -> Self {
        Self {
            history,
            config,
            database_path: database_path.into(),
            key: None,
        }
    }

    /// Encrypt new backups with `key` (or keep them plaintext with `None`)
    pub fn with_encryption_key(mut self, key: Option<BackupKey>) -> Self {
        self.key = key;
        self
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn encryption_key(&self) -> Option<&BackupKey> {
        self.key.as_ref()
    }

    /// Configured backup directory, made absolute against the current directory
    ///
    /// Recorded `file_path`s are built from this, so a later run from another
    /// working directory still finds the files.
    pub fn backup_dir(&self) -> BackupResult<PathBuf> {
        let location = self.config.get(BACKUP_LOCATION, DEFAULT_LOCATION)?;
        let location = if location.trim().is_empty() {
            PathBuf::from(DEFAULT_LOCATION)
        } else {
            PathBuf::from(location)
        };

        if location.is_absolute() {
            return Ok(location);
        }
        let cwd = std::env::current_dir().map_err(|e| {
            BackupError::Io(format!("Failed to resolve {}: {}", location.display(), e))
        })?;
        Ok(cwd.join(location))
    }

    pub fn frequency(&self) -> BackupResult<BackupFrequency> {
        let raw = self.config.get(BACKUP_FREQUENCY, DEFAULT_FREQUENCY)?;
        Ok(BackupFrequency::parse(&raw))
    }

    pub fn retention(&self) -> BackupResult<RetentionPolicy> {
        let raw = self.config.get(BACKUP_RETENTION, DEFAULT_RETENTION)?;
        Ok(RetentionPolicy::from_config_value(&raw))
    }

    /// Whether an automatic backup was already recorded on `now`'s local day
    pub fn already_backed_up_today(&self, now: DateTime<Utc>) -> BackupResult<bool> {
        self.history
            .query_today(BackupKind::Automatic, local_day_start(now))
    }

    /// Run a backup now
    pub fn run_backup(&self, kind: BackupKind) -> BackupResult<BackupOutcome> {
        self.run_backup_at(kind, Utc::now())
    }

    /// Run a backup as if the current time were `now`
    pub fn run_backup_at(
        &self,
        kind: BackupKind,
        now: DateTime<Utc>,
    ) -> BackupResult<BackupOutcome> {
        if kind == BackupKind::Automatic {
            let frequency = self.frequency()?;
            if frequency.is_daily() && self.already_backed_up_today(now)? {
                tracing::info!("daily backup already done today, skipping");
                return Ok(BackupOutcome::Skipped);
            }
        }

        let backup_dir = self.backup_dir()?;
        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir).map_err(|e| {
                BackupError::Io(format!(
                    "Failed to create backup directory {}: {}",
                    backup_dir.display(),
                    e
                ))
            })?;
            tracing::info!(path = %backup_dir.display(), "backup directory created");
        }

        let filename = snapshot_filename(kind, now);
        let snapshot_path = backup_dir.join(&filename);
        let copied = self.snapshot(&snapshot_path)?;
        tracing::info!(path = %snapshot_path.display(), bytes = copied, "snapshot created");

        let mut warnings = Vec::new();
        let persisted = self
            .prepare_record(kind, now, filename, &snapshot_path, &mut warnings)
            .and_then(|pending| {
                let id = self.history.append(pending.clone())?;
                Ok((id, pending))
            });

        let (id, pending) = match persisted {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::error!(error = %e, "backup failed, discarding snapshot");
                discard_artifacts(&snapshot_path);
                return Err(e);
            }
        };

        let record = match self.history.get(id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!(id = %id, "appended record not found, reporting it as submitted");
                pending.with_id(id)
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "could not read back appended record");
                pending.with_id(id)
            }
        };
        tracing::info!(
            filename = %record.filename,
            kind = %record.kind,
            size_bytes = record.size_bytes,
            "backup completed"
        );

        let sweep = match self.sweep(now) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "retention sweep could not run");
                SweepReport {
                    removed: Vec::new(),
                    failures: vec![e],
                }
            }
        };

        Ok(BackupOutcome::Completed(CompletedBackup {
            record,
            warnings,
            sweep,
        }))
    }

    /// Delete expired automatic backups, file first and then record
    ///
    /// Only a failure to read the config or list candidates is returned as an
    /// error; a record that cannot be removed is logged and collected.
    pub fn sweep(&self, now: DateTime<Utc>) -> BackupResult<SweepReport> {
        let policy = self.retention()?;
        let candidates = self
            .history
            .list_expired(BackupKind::Automatic, policy.cutoff(now))?;

        let mut report = SweepReport::default();
        for record in policy.expired(&candidates, now) {
            match self.remove_expired(&record) {
                Ok(()) => {
                    tracing::info!(filename = %record.filename, "expired backup removed");
                    report.removed.push(record);
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to remove expired backup");
                    report.failures.push(e);
                }
            }
        }

        if !report.removed.is_empty() {
            tracing::info!(
                count = report.removed.len(),
                retention_days = policy.retention_days(),
                "retention sweep finished"
            );
        }

        Ok(report)
    }

    fn remove_expired(&self, record: &BackupRecord) -> BackupResult<()> {
        let cleanup_error = |reason: String| BackupError::Cleanup {
            filename: record.filename.clone(),
            reason,
        };

        match fs::remove_file(&record.file_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(filename = %record.filename, "expired backup file already absent");
            }
            Err(e) => return Err(cleanup_error(format!("failed to delete file: {}", e))),
        }

        self.history
            .delete(record.id)
            .map_err(|e| cleanup_error(format!("file deleted but record kept: {}", e)))
    }

    /// Copy the source database byte-for-byte into a new file
    fn snapshot(&self, target: &Path) -> BackupResult<u64> {
        if !self.database_path.exists() {
            tracing::error!(path = %self.database_path.display(), "source database not found");
            return Err(BackupError::SourceMissing(self.database_path.clone()));
        }

        // An encrypted backup with this name would be overwritten by ours
        let encrypted_target = encrypted_path_for(target);
        if encrypted_target.exists() {
            return Err(BackupError::Io(format!(
                "Backup {} already exists",
                encrypted_target.display()
            )));
        }

        let mut source = File::open(&self.database_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => BackupError::SourceMissing(self.database_path.clone()),
            _ => BackupError::Io(format!("Failed to open source database: {}", e)),
        })?;

        let mut dest = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(target)
            .map_err(|e| {
                BackupError::Io(format!(
                    "Failed to create snapshot {}: {}",
                    target.display(),
                    e
                ))
            })?;

        let copied = io::copy(&mut source, &mut dest).and_then(|n| dest.sync_all().map(|_| n));
        match copied {
            Ok(n) => Ok(n),
            Err(e) => {
                drop(dest);
                let _ = fs::remove_file(target);
                Err(BackupError::Io(format!("Failed to copy database: {}", e)))
            }
        }
    }

    /// Digest the snapshot, then encrypt it or keep it as-is
    fn prepare_record(
        &self,
        kind: BackupKind,
        now: DateTime<Utc>,
        filename: String,
        snapshot_path: &Path,
        warnings: &mut Vec<String>,
    ) -> BackupResult<NewBackupRecord> {
        let checksum = crypto::digest(snapshot_path)?;

        let (filename, file_path, encrypted) = match &self.key {
            Some(key) => {
                let encrypted_path = crypto::encrypt_file(snapshot_path, key)?;
                tracing::info!("backup encrypted with AES-256-GCM");
                (
                    format!("{}{}", filename, ENCRYPTED_SUFFIX),
                    encrypted_path,
                    true,
                )
            }
            None => {
                tracing::warn!("{}", UNENCRYPTED_WARNING);
                warnings.push(UNENCRYPTED_WARNING.to_string());
                (filename, snapshot_path.to_path_buf(), false)
            }
        };

        let size_bytes = fs::metadata(&file_path)
            .map_err(|e| {
                BackupError::Io(format!("Failed to stat {}: {}", file_path.display(), e))
            })?
            .len();

        Ok(NewBackupRecord {
            filename,
            kind,
            size_bytes,
            created_at: now,
            file_path,
            checksum,
            encrypted,
        })
    }
}

/// Remove whatever a failed attempt left on disk
fn discard_artifacts(snapshot_path: &Path) {
    for path in [snapshot_path.to_path_buf(), encrypted_path_for(snapshot_path)] {
        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "discarded partial backup"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not discard partial backup")
            }
        }
    }
}

/// Start of `now`'s calendar day in local time
fn local_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.with_timezone(&Local).date_naive();

    // Walk past a DST gap at midnight to the first valid local time
    (0..=2)
        .filter_map(|hour| today.and_hms_opt(hour, 0, 0))
        .find_map(|naive| naive.and_local_timezone(Local).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{BACKUP_FREQUENCY, BACKUP_RETENTION};
    use crate::models::{BackupCounts, RecordId};
    use crate::storage::MemoryHistoryStore;
    use chrono::Duration;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const DB_CONTENTS: &[u8] = b"SQLite format 3\0 pretend pages of rows";

    struct Fixture {
        temp: TempDir,
        config: HashMap<String, String>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            fs::write(temp.path().join("app.db"), DB_CONTENTS).unwrap();

            let mut config = HashMap::new();
            config.insert(
                BACKUP_LOCATION.to_string(),
                temp.path().join("backups").display().to_string(),
            );
            Self { temp, config }
        }

        fn set(mut self, key: &str, value: &str) -> Self {
            self.config.insert(key.to_string(), value.to_string());
            self
        }

        fn backup_dir(&self) -> PathBuf {
            self.temp.path().join("backups")
        }

        fn manager(
            &self,
            history: MemoryHistoryStore,
        ) -> BackupManager<MemoryHistoryStore, HashMap<String, String>> {
            BackupManager::new(history, self.config.clone(), self.temp.path().join("app.db"))
        }

        fn backup_files(&self) -> Vec<String> {
            let mut names: Vec<_> = fs::read_dir(self.backup_dir())
                .map(|entries| {
                    entries
                        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                        .collect()
                })
                .unwrap_or_default();
            names.sort();
            names
        }

        /// An old automatic or manual record, optionally with its file on disk
        fn aged_record(&self, days: i64, kind: BackupKind, with_file: bool) -> BackupRecord {
            let created_at = Utc::now() - Duration::days(days);
            let filename = format!("backup_{}_{}d.db", kind.file_label(), days);
            let file_path = self.backup_dir().join(&filename);
            if with_file {
                fs::create_dir_all(self.backup_dir()).unwrap();
                fs::write(&file_path, b"old").unwrap();
            }
            NewBackupRecord {
                filename,
                kind,
                size_bytes: 3,
                created_at,
                file_path,
                checksum: crypto::digest_bytes(b"old"),
                encrypted: false,
            }
            .with_id(RecordId::new())
        }
    }

    fn completed(outcome: BackupOutcome) -> CompletedBackup {
        match outcome {
            BackupOutcome::Completed(done) => done,
            BackupOutcome::Skipped => panic!("expected a completed backup"),
        }
    }

    fn test_key() -> BackupKey {
        BackupKey::from_bytes(&[0x5A; 32]).unwrap()
    }

    /// Noon today in local time, far from either day boundary
    fn local_noon() -> DateTime<Utc> {
        Local::now()
            .date_naive()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_local_timezone(Local)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_local_day_start_precedes_now() {
        let noon = local_noon();
        let start = local_day_start(noon);
        assert!(start <= noon);
        assert!(noon - start <= Duration::hours(13));
        assert_eq!(
            start.with_timezone(&Local).date_naive(),
            noon.with_timezone(&Local).date_naive()
        );
    }

    #[test]
    fn test_snapshot_filename() {
        let at = Utc::now();
        let auto = snapshot_filename(BackupKind::Automatic, at);
        let manual = snapshot_filename(BackupKind::Manual, at);

        assert!(auto.starts_with("backup_auto_"));
        assert!(manual.starts_with("backup_manual_"));
        assert!(auto.ends_with(".db"));
        // backup_auto_ + YYYYMMDD_HHMMSS + .db
        assert_eq!(auto.len(), "backup_auto_".len() + 15 + 3);
    }

    #[test]
    fn test_backup_without_key_keeps_plaintext() {
        let fixture = Fixture::new();
        let manager = fixture.manager(MemoryHistoryStore::new());

        let done = completed(manager.run_backup(BackupKind::Manual).unwrap());

        assert!(done.record.filename.ends_with(".db"));
        assert!(!done.record.encrypted);
        assert_eq!(done.warnings, vec![UNENCRYPTED_WARNING.to_string()]);
        assert_eq!(done.record.checksum, crypto::digest_bytes(DB_CONTENTS));
        assert_eq!(done.record.size_bytes, DB_CONTENTS.len() as u64);
        assert_eq!(fs::read(&done.record.file_path).unwrap(), DB_CONTENTS);
        assert_eq!(manager.history().counts().unwrap().manual, 1);
    }

    #[test]
    fn test_backup_with_key_encrypts() {
        let fixture = Fixture::new();
        let manager = fixture
            .manager(MemoryHistoryStore::new())
            .with_encryption_key(Some(test_key()));

        let done = completed(manager.run_backup(BackupKind::Automatic).unwrap());
        let record = &done.record;

        assert!(record.encrypted);
        assert!(record.filename.ends_with(".db.enc"));
        assert!(done.warnings.is_empty());

        let stored = fs::read(&record.file_path).unwrap();
        assert_ne!(stored, DB_CONTENTS);
        assert_eq!(record.size_bytes, stored.len() as u64);

        // checksum audits the plaintext, not the envelope
        assert_eq!(record.checksum, crypto::digest_bytes(DB_CONTENTS));
        let plaintext = crypto::decrypt_to_vec(&record.file_path, &test_key()).unwrap();
        assert_eq!(plaintext.as_slice(), DB_CONTENTS);

        // only the envelope remains on disk
        assert_eq!(fixture.backup_files(), vec![record.filename.clone()]);
    }

    #[test]
    fn test_daily_gate_allows_one_automatic_backup_per_day() {
        let fixture = Fixture::new();
        let manager = fixture.manager(MemoryHistoryStore::new());
        let now = local_noon();

        let first = manager.run_backup_at(BackupKind::Automatic, now).unwrap();
        let second = manager
            .run_backup_at(BackupKind::Automatic, now + Duration::seconds(1))
            .unwrap();

        assert!(!first.is_skipped());
        assert!(second.is_skipped());
        assert_eq!(manager.history().counts().unwrap().total, 1);
        assert_eq!(fixture.backup_files().len(), 1);
    }

    #[test]
    fn test_yesterdays_backup_does_not_gate_today() {
        let fixture = Fixture::new();
        let yesterday = fixture.aged_record(2, BackupKind::Automatic, true);
        let manager = fixture.manager(MemoryHistoryStore::with_records(vec![yesterday]));

        let outcome = manager.run_backup(BackupKind::Automatic).unwrap();
        assert!(!outcome.is_skipped());
    }

    #[test]
    fn test_manual_bypasses_gate() {
        let fixture = Fixture::new();
        let manager = fixture.manager(MemoryHistoryStore::new());
        let now = local_noon();

        manager.run_backup_at(BackupKind::Automatic, now).unwrap();
        let manual = manager
            .run_backup_at(BackupKind::Manual, now + Duration::seconds(1))
            .unwrap();

        assert!(!manual.is_skipped());
        assert_eq!(
            manager.history().counts().unwrap(),
            BackupCounts {
                total: 2,
                automatic: 1,
                manual: 1
            }
        );
    }

    #[test]
    fn test_non_daily_frequency_does_not_gate() {
        let fixture = Fixture::new().set(BACKUP_FREQUENCY, "weekly");
        let manager = fixture.manager(MemoryHistoryStore::new());
        let now = local_noon();

        manager.run_backup_at(BackupKind::Automatic, now).unwrap();
        let second = manager
            .run_backup_at(BackupKind::Automatic, now + Duration::seconds(1))
            .unwrap();

        assert!(!second.is_skipped());
        assert_eq!(manager.history().counts().unwrap().automatic, 2);
    }

    #[test]
    fn test_missing_source_fails_without_record() {
        let fixture = Fixture::new();
        fs::remove_file(fixture.temp.path().join("app.db")).unwrap();
        let manager = fixture.manager(MemoryHistoryStore::new());

        let err = manager.run_backup(BackupKind::Manual).unwrap_err();

        assert!(err.is_source_missing());
        assert_eq!(manager.history().counts().unwrap().total, 0);
        assert!(fixture.backup_files().is_empty());
    }

    #[test]
    fn test_same_second_collision_fails_and_keeps_first_backup() {
        let fixture = Fixture::new();
        let manager = fixture
            .manager(MemoryHistoryStore::new())
            .with_encryption_key(Some(test_key()));
        let now = Utc::now();

        let first = completed(manager.run_backup_at(BackupKind::Manual, now).unwrap());
        let before = fs::read(&first.record.file_path).unwrap();

        assert!(manager.run_backup_at(BackupKind::Manual, now).is_err());
        assert_eq!(manager.history().counts().unwrap().total, 1);
        assert_eq!(fs::read(&first.record.file_path).unwrap(), before);
        assert_eq!(fixture.backup_files().len(), 1);
    }

    #[test]
    fn test_sweep_removes_only_expired_automatic_backups() {
        let fixture = Fixture::new().set(BACKUP_RETENTION, "30");
        let old_auto = fixture.aged_record(40, BackupKind::Automatic, true);
        let old_manual = fixture.aged_record(40, BackupKind::Manual, true);
        let recent_auto = fixture.aged_record(10, BackupKind::Automatic, true);
        let manager = fixture.manager(MemoryHistoryStore::with_records(vec![
            old_auto.clone(),
            old_manual.clone(),
            recent_auto.clone(),
        ]));

        let done = completed(manager.run_backup(BackupKind::Manual).unwrap());

        assert!(done.sweep.is_clean());
        assert_eq!(done.sweep.removed.len(), 1);
        assert_eq!(done.sweep.removed[0].id, old_auto.id);
        assert!(!old_auto.file_path.exists());
        assert!(old_manual.file_path.exists());
        assert!(recent_auto.file_path.exists());

        let history = manager.history();
        assert!(history.get(old_auto.id).unwrap().is_none());
        assert!(history.get(old_manual.id).unwrap().is_some());
        assert_eq!(history.counts().unwrap().total, 3);
    }

    #[test]
    fn test_sweep_tolerates_already_deleted_file() {
        let fixture = Fixture::new();
        let orphan = fixture.aged_record(45, BackupKind::Automatic, false);
        let manager = fixture.manager(MemoryHistoryStore::with_records(vec![orphan.clone()]));

        let report = manager.sweep(Utc::now()).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.removed.len(), 1);
        assert!(manager.history().get(orphan.id).unwrap().is_none());
    }

    #[test]
    fn test_sweep_failure_does_not_fail_backup() {
        let fixture = Fixture::new();
        let stuck = fixture.aged_record(50, BackupKind::Automatic, false);
        // A non-empty directory in place of the file cannot be removed with remove_file
        fs::create_dir_all(stuck.file_path.join("inner")).unwrap();
        let ok = fixture.aged_record(60, BackupKind::Automatic, true);
        let manager =
            fixture.manager(MemoryHistoryStore::with_records(vec![stuck.clone(), ok.clone()]));

        let done = completed(manager.run_backup(BackupKind::Manual).unwrap());

        assert_eq!(done.sweep.failures.len(), 1);
        assert!(matches!(done.sweep.failures[0], BackupError::Cleanup { .. }));
        assert_eq!(done.sweep.removed.len(), 1);
        assert_eq!(done.sweep.removed[0].id, ok.id);
        assert!(manager.history().get(stuck.id).unwrap().is_some());
    }

    /// Memory store that can be told to fail appends or reads by ID
    struct FaultyHistory {
        inner: MemoryHistoryStore,
        fail_append: bool,
        fail_get: bool,
    }

    impl HistoryStore for FaultyHistory {
        fn append(&self, record: NewBackupRecord) -> BackupResult<RecordId> {
            if self.fail_append {
                return Err(BackupError::Store("history backend unavailable".into()));
            }
            self.inner.append(record)
        }

        fn get(&self, id: RecordId) -> BackupResult<Option<BackupRecord>> {
            if self.fail_get {
                return Err(BackupError::Store("history read timed out".into()));
            }
            self.inner.get(id)
        }

        fn query_today(&self, kind: BackupKind, day_start: DateTime<Utc>) -> BackupResult<bool> {
            self.inner.query_today(kind, day_start)
        }

        fn list_expired(
            &self,
            kind: BackupKind,
            cutoff: DateTime<Utc>,
        ) -> BackupResult<Vec<BackupRecord>> {
            self.inner.list_expired(kind, cutoff)
        }

        fn most_recent(&self) -> BackupResult<Option<BackupRecord>> {
            self.inner.most_recent()
        }

        fn counts(&self) -> BackupResult<BackupCounts> {
            self.inner.counts()
        }

        fn delete(&self, id: RecordId) -> BackupResult<()> {
            self.inner.delete(id)
        }

        fn list(&self) -> BackupResult<Vec<BackupRecord>> {
            self.inner.list()
        }
    }

    #[test]
    fn test_failed_persist_leaves_no_artifact() {
        let fixture = Fixture::new();
        let manager = BackupManager::new(
            FaultyHistory {
                inner: MemoryHistoryStore::new(),
                fail_append: true,
                fail_get: false,
            },
            fixture.config.clone(),
            fixture.temp.path().join("app.db"),
        )
        .with_encryption_key(Some(test_key()));

        let err = manager.run_backup(BackupKind::Manual).unwrap_err();

        assert!(matches!(err, BackupError::Store(_)));
        assert!(fixture.backup_files().is_empty());
    }

    #[test]
    fn test_unreadable_record_still_completes() {
        let fixture = Fixture::new();
        let manager = BackupManager::new(
            FaultyHistory {
                inner: MemoryHistoryStore::new(),
                fail_append: false,
                fail_get: true,
            },
            fixture.config.clone(),
            fixture.temp.path().join("app.db"),
        );

        let done = completed(manager.run_backup(BackupKind::Manual).unwrap());

        assert_eq!(done.record.kind, BackupKind::Manual);
        assert!(done.record.file_path.exists());
        assert_eq!(manager.history().inner.counts().unwrap().total, 1);
    }

    #[test]
    fn test_relative_backup_dir_is_recorded_absolute() {
        let fixture = Fixture::new().set(BACKUP_LOCATION, "backups/");
        let manager = fixture.manager(MemoryHistoryStore::new());

        let dir = manager.backup_dir().unwrap();
        assert!(dir.is_absolute());
        assert_eq!(dir, std::env::current_dir().unwrap().join("backups/"));

        let empty = Fixture::new().set(BACKUP_LOCATION, "  ");
        let dir = empty.manager(MemoryHistoryStore::new()).backup_dir().unwrap();
        assert_eq!(dir, std::env::current_dir().unwrap().join(DEFAULT_LOCATION));
    }

    #[test]
    fn test_backup_dir_is_created() {
        let fixture = Fixture::new();
        let nested = fixture.temp.path().join("a").join("b").join("backups");
        let fixture = fixture.set(BACKUP_LOCATION, &nested.display().to_string());
        let manager = fixture.manager(MemoryHistoryStore::new());

        manager.run_backup(BackupKind::Manual).unwrap();
        assert!(nested.is_dir());
    }
}
