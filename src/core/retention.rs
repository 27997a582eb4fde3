//! Retention of log partitions and key files
//!
//! Files are aged by the date stamped into their names, never by filesystem
//! metadata. A name that doesn't follow the expected pattern is left alone.

use crate::crypto::parse_key_file_name;
use crate::domain::{Result, VigilError};
use crate::storage::layout::{ENCRYPTED_EXTENSION, RAW_EXTENSION};
use crate::storage::{parse_partition_file_name, StorageLayout};
use chrono::{Duration, Local, NaiveDateTime};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Retention policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Files older than this many days are removed
    pub max_age_days: u32,

    /// How often the periodic runner purges
    pub cleanup_interval: std::time::Duration,
}

impl RetentionPolicy {
    /// Keep files for `max_age_days`, purge daily
    pub fn days(max_age_days: u32) -> Self {
        Self {
            max_age_days,
            cleanup_interval: std::time::Duration::from_secs(24 * 3600),
        }
    }

    /// Set cleanup interval
    pub fn cleanup_interval(mut self, interval: std::time::Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

/// The three storage areas retention scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    /// Redacted stream partitions
    RawLogs,
    /// Encrypted stream partitions
    EncryptedLogs,
    /// Persisted key files
    Keys,
}

impl StorageArea {
    /// All areas, in scan order
    pub const ALL: [StorageArea; 3] = [
        StorageArea::RawLogs,
        StorageArea::EncryptedLogs,
        StorageArea::Keys,
    ];

    /// Directory of this area under `layout`
    pub fn dir(self, layout: &StorageLayout) -> PathBuf {
        match self {
            StorageArea::RawLogs => layout.raw_dir(),
            StorageArea::EncryptedLogs => layout.encrypted_dir(),
            StorageArea::Keys => layout.keys_dir(),
        }
    }

    /// Read the date stamped into a file name of this area
    ///
    /// Partitions are stamped at local midnight of their day, key files at
    /// their full creation time.
    pub fn classify(self, file_name: &str) -> FileStamp {
        let stamp = match self {
            StorageArea::RawLogs => {
                parse_partition_file_name(file_name, RAW_EXTENSION).map(|d| d.start_of_day())
            }
            StorageArea::EncryptedLogs => {
                parse_partition_file_name(file_name, ENCRYPTED_EXTENSION).map(|d| d.start_of_day())
            }
            StorageArea::Keys => parse_key_file_name(file_name),
        };
        stamp.map_or(FileStamp::Unrecognized, FileStamp::Stamped)
    }
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageArea::RawLogs => "raw",
            StorageArea::EncryptedLogs => "encrypted",
            StorageArea::Keys => "keys",
        };
        write!(f, "{name}")
    }
}

/// Outcome of reading a file name's date stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStamp {
    /// The name carries this local date-time
    Stamped(NaiveDateTime),
    /// The name doesn't match the area's pattern; the file is never deleted
    Unrecognized,
}

/// What a purge did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Files deleted
    pub removed: Vec<PathBuf>,
    /// Stamped files young enough to keep (or protected)
    pub retained: usize,
    /// Files left alone because their names carry no recognizable date
    pub skipped: Vec<PathBuf>,
}

/// Retention manager
///
/// Deletes partition and key files older than a cutoff. Deletion is permanent.
/// Do not run a purge while entries are being appended to the same storage.
#[derive(Debug, Clone)]
pub struct RetentionManager {
    layout: StorageLayout,
    protected: HashSet<PathBuf>,
}

impl RetentionManager {
    /// Create a retention manager over `layout`
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            layout,
            protected: HashSet::new(),
        }
    }

    /// Never delete `path`, whatever its age (e.g. the active key file)
    pub fn protect(mut self, path: impl Into<PathBuf>) -> Self {
        self.protected.insert(path.into());
        self
    }

    /// Delete files dated before now minus `older_than_days` days
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vigil::core::retention::RetentionManager;
    /// use vigil::storage::StorageLayout;
    ///
    /// # fn example() -> vigil::domain::Result<()> {
    /// let manager = RetentionManager::new(StorageLayout::new("logs"));
    /// let report = manager.purge(30)?;
    /// println!("Deleted {} files", report.removed.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn purge(&self, older_than_days: u32) -> Result<PurgeReport> {
        // Ages past chrono's range keep everything
        let cutoff = Duration::try_days(i64::from(older_than_days))
            .and_then(|age| Local::now().naive_local().checked_sub_signed(age))
            .unwrap_or(NaiveDateTime::MIN);
        self.purge_before(cutoff)
    }

    /// Delete files whose stamp is strictly before `cutoff` (local time)
    pub fn purge_before(&self, cutoff: NaiveDateTime) -> Result<PurgeReport> {
        info!(cutoff = %cutoff, root = %self.layout.root().display(), "Running retention purge");

        let mut report = PurgeReport::default();
        for area in StorageArea::ALL {
            self.purge_area(area, cutoff, &mut report)?;
        }

        info!(
            removed = report.removed.len(),
            retained = report.retained,
            skipped = report.skipped.len(),
            "Retention purge finished"
        );
        Ok(report)
    }

    fn purge_area(
        &self,
        area: StorageArea,
        cutoff: NaiveDateTime,
        report: &mut PurgeReport,
    ) -> Result<()> {
        let dir = area.dir(&self.layout);
        if !dir.is_dir() {
            debug!(area = %area, dir = %dir.display(), "Retention area missing, skipping");
            return Ok(());
        }

        for dir_entry in fs::read_dir(&dir).map_err(|e| VigilError::storage(&dir, e))? {
            let dir_entry = dir_entry.map_err(|e| VigilError::storage(&dir, e))?;
            let path = dir_entry.path();
            let is_file = dir_entry
                .file_type()
                .map_err(|e| VigilError::storage(&path, e))?
                .is_file();
            if !is_file {
                continue;
            }

            let stamp = dir_entry
                .file_name()
                .to_str()
                .map_or(FileStamp::Unrecognized, |name| area.classify(name));

            match stamp {
                FileStamp::Unrecognized => {
                    debug!(area = %area, path = %path.display(), "Unrecognized file name, leaving in place");
                    report.skipped.push(path);
                }
                FileStamp::Stamped(stamped) if stamped < cutoff && !self.is_protected(&path) => {
                    fs::remove_file(&path).map_err(|e| VigilError::storage(&path, e))?;
                    info!(area = %area, path = %path.display(), stamped = %stamped, "Removed expired file");
                    report.removed.push(path);
                }
                FileStamp::Stamped(_) => report.retained += 1,
            }
        }
        Ok(())
    }

    fn is_protected(&self, path: &Path) -> bool {
        self.protected.contains(path)
    }

    /// Purge on an interval until `shutdown` flips to `true`
    ///
    /// The first purge runs immediately. A failed purge is logged and the loop
    /// keeps going.
    pub async fn run_periodic(
        self: Arc<Self>,
        policy: RetentionPolicy,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(policy.cleanup_interval);
        info!(
            max_age_days = policy.max_age_days,
            interval_secs = policy.cleanup_interval.as_secs(),
            "Periodic retention started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let manager = Arc::clone(&self);
                    let days = policy.max_age_days;
                    match tokio::task::spawn_blocking(move || manager.purge(days)).await {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => {
                            crate::log_error_with_context!(&e, "Periodic purge failed");
                        }
                        Err(e) => error!(error = %e, "Periodic purge task panicked"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Periodic retention stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_case::test_case;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test_case(StorageArea::RawLogs, "2025-01-31.ndjson", Some(at(2025, 1, 31, 0)) ; "raw partition")]
    #[test_case(StorageArea::EncryptedLogs, "2025-01-31.enc", Some(at(2025, 1, 31, 0)) ; "encrypted partition")]
    #[test_case(StorageArea::Keys, "key_20250131_070000.key", Some(at(2025, 1, 31, 7)) ; "key file")]
    #[test_case(StorageArea::RawLogs, "2025-01-31.enc", None ; "extension of other area")]
    #[test_case(StorageArea::Keys, "key_latest.key", None ; "key without stamp")]
    #[test_case(StorageArea::EncryptedLogs, ".DS_Store", None ; "hidden file")]
    fn test_classify(area: StorageArea, name: &str, expected: Option<NaiveDateTime>) {
        let expected = expected.map_or(FileStamp::Unrecognized, FileStamp::Stamped);
        assert_eq!(area.classify(name), expected);
    }

    #[test]
    fn test_policy_builder() {
        let policy = RetentionPolicy::days(90).cleanup_interval(std::time::Duration::from_secs(60));
        assert_eq!(policy.max_age_days, 90);
        assert_eq!(policy.cleanup_interval.as_secs(), 60);
    }

    #[test]
    fn test_area_display() {
        assert_eq!(StorageArea::Keys.to_string(), "keys");
        assert_eq!(StorageArea::RawLogs.to_string(), "raw");
    }

    #[test]
    fn test_missing_root_is_a_no_op() {
        let dir = tempfile::TempDir::new().unwrap();
        let manager = RetentionManager::new(StorageLayout::new(dir.path().join("absent")));
        assert_eq!(manager.purge(30).unwrap(), PurgeReport::default());
    }

    #[test]
    fn test_cutoff_is_strict() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = StorageLayout::new(dir.path());
        layout.ensure().unwrap();
        let path = layout.raw_dir().join("2025-01-31.ndjson");
        fs::write(&path, b"").unwrap();

        let manager = RetentionManager::new(layout);
        let report = manager.purge_before(at(2025, 1, 31, 0)).unwrap();
        assert!(report.removed.is_empty());
        assert!(path.exists());

        let report = manager.purge_before(at(2025, 1, 31, 1)).unwrap();
        assert_eq!(report.removed, vec![path]);
    }

    #[test]
    fn test_age_beyond_calendar_range_keeps_everything() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = StorageLayout::new(dir.path());
        layout.ensure().unwrap();
        let partition = layout.raw_dir().join("1970-01-01.ndjson");
        let key = layout.keys_dir().join("key_19700101_000000.key");
        fs::write(&partition, b"").unwrap();
        fs::write(&key, b"k").unwrap();

        let report = RetentionManager::new(layout).purge(u32::MAX).unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.retained, 2);
        assert!(partition.exists() && key.exists());
    }

    #[test]
    fn test_protected_file_survives() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = StorageLayout::new(dir.path());
        layout.ensure().unwrap();
        let key = layout.keys_dir().join("key_20200101_000000.key");
        fs::write(&key, b"k").unwrap();

        let manager = RetentionManager::new(layout).protect(&key);
        let report = manager.purge(1).unwrap();
        assert!(key.exists());
        assert_eq!(report.retained, 1);
    }

    #[test]
    fn test_directories_are_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = StorageLayout::new(dir.path());
        layout.ensure().unwrap();
        let nested = layout.raw_dir().join("2000-01-01.ndjson");
        fs::create_dir(&nested).unwrap();

        let report = RetentionManager::new(layout).purge(1).unwrap();
        assert!(nested.is_dir());
        assert!(report.removed.is_empty());
    }

    #[tokio::test]
    async fn test_run_periodic_stops_on_shutdown() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = StorageLayout::new(dir.path());
        layout.ensure().unwrap();
        let old = layout.encrypted_dir().join("2000-01-01.enc");
        fs::write(&old, b"").unwrap();

        let manager = Arc::new(RetentionManager::new(layout));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let policy = RetentionPolicy::days(30).cleanup_interval(std::time::Duration::from_millis(20));
        let handle = tokio::spawn(Arc::clone(&manager).run_periodic(policy, shutdown_rx));

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(!old.exists());
    }
}
