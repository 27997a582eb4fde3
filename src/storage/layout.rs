//! On-disk layout of the audit log
//!
//! ```text
//! <root>/
//!   raw/2025-01-31.ndjson       redacted stream, one JSON object per line
//!   encrypted/2025-01-31.enc    encrypted stream, length-prefixed frames
//!   keys/key_20250131_093000.key
//! ```

use crate::domain::{PartitionDate, Result, VigilError};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory holding the redacted stream
pub const RAW_DIR: &str = "raw";
/// Directory holding the encrypted stream
pub const ENCRYPTED_DIR: &str = "encrypted";
/// Directory holding persisted key material
pub const KEYS_DIR: &str = "keys";

/// Extension of redacted partition files
pub const RAW_EXTENSION: &str = "ndjson";
/// Extension of encrypted partition files
pub const ENCRYPTED_EXTENSION: &str = "enc";

/// Paths of the three storage areas under one root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Create a layout rooted at `root`; nothing is touched on disk
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create all three area directories if missing
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.raw_dir(), self.encrypted_dir(), self.keys_dir()] {
            fs::create_dir_all(&dir).map_err(|e| VigilError::storage(&dir, e))?;
        }
        tracing::debug!(root = %self.root.display(), "Storage layout ready");
        Ok(())
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the redacted stream
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(RAW_DIR)
    }

    /// Directory of the encrypted stream
    pub fn encrypted_dir(&self) -> PathBuf {
        self.root.join(ENCRYPTED_DIR)
    }

    /// Directory of key files
    pub fn keys_dir(&self) -> PathBuf {
        self.root.join(KEYS_DIR)
    }

    /// Redacted partition file for `date`
    pub fn raw_path(&self, date: PartitionDate) -> PathBuf {
        self.raw_dir().join(format!("{date}.{RAW_EXTENSION}"))
    }

    /// Encrypted partition file for `date`
    pub fn encrypted_path(&self, date: PartitionDate) -> PathBuf {
        self.encrypted_dir()
            .join(format!("{date}.{ENCRYPTED_EXTENSION}"))
    }

    /// Dates that have a file in either stream, oldest first
    ///
    /// Missing directories count as empty; foreign file names are ignored.
    pub fn partitions(&self) -> Result<Vec<PartitionDate>> {
        let mut dates = BTreeSet::new();
        for (dir, extension) in [
            (self.raw_dir(), RAW_EXTENSION),
            (self.encrypted_dir(), ENCRYPTED_EXTENSION),
        ] {
            let listing = match fs::read_dir(&dir) {
                Ok(listing) => listing,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(VigilError::storage(&dir, e)),
            };
            for dir_entry in listing {
                let dir_entry = dir_entry.map_err(|e| VigilError::storage(&dir, e))?;
                if let Some(date) = dir_entry
                    .file_name()
                    .to_str()
                    .and_then(|name| parse_partition_file_name(name, extension))
                {
                    dates.insert(date);
                }
            }
        }
        Ok(dates.into_iter().collect())
    }
}

/// Extracts the partition date from a file name such as `2025-01-31.ndjson`
///
/// Returns `None` for anything that isn't exactly `<YYYY-MM-DD>.<extension>`.
pub fn parse_partition_file_name(name: &str, extension: &str) -> Option<PartitionDate> {
    let stem = name.strip_suffix(extension)?.strip_suffix('.')?;
    PartitionDate::parse(stem).ok()
}
