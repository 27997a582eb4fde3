//! Key store: one file per cipher initialization
//!
//! Key files are named after the local time of the cipher's construction,
//! `key_YYYYMMDD_HHMMSS.key`. A second initialization within the same second
//! gets a numeric suffix (`key_YYYYMMDD_HHMMSS_1.key`) so no key is ever
//! overwritten.

use crate::config::{secret_string, SecretString};
use crate::domain::{Result, VigilError};
use chrono::{DateTime, Local, NaiveDateTime};
use secrecy::ExposeSecret;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const KEY_PREFIX: &str = "key_";
const KEY_EXTENSION: &str = ".key";
const KEY_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const KEY_STAMP_LEN: usize = 15;
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// A key file found in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFile {
    /// Location of the file
    pub path: PathBuf,
    /// Construction time parsed from the name
    pub created_at: NaiveDateTime,
}

/// Directory of persisted keys
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    /// Create a key store over `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the store writes to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the key text to a new file stamped with `created_at`
    ///
    /// The file is created exclusively and restricted to the owner on Unix.
    pub fn persist(&self, key_text: &SecretString, created_at: DateTime<Local>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| VigilError::storage(&self.dir, e))?;

        let naive = created_at.naive_local();
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(key_file_name(&naive, attempt));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(VigilError::storage(&path, e)),
            };

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
                    .map_err(|e| VigilError::storage(&path, e))?;
            }

            file.write_all(key_text.expose_secret().as_str().as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| VigilError::storage(&path, e))?;

            tracing::info!(path = %path.display(), "Encryption key persisted");
            return Ok(path);
        }

        Err(VigilError::Storage(format!(
            "No free key file name in {} for {}",
            self.dir.display(),
            naive.format(KEY_STAMP_FORMAT)
        )))
    }

    /// Read the key text from a key file
    pub fn load(path: impl AsRef<Path>) -> Result<SecretString> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| VigilError::storage(path, e))?;
        Ok(secret_string(text.trim().to_string()))
    }

    /// Key files in the store, oldest first; foreign names are ignored
    pub fn list(&self) -> Result<Vec<KeyFile>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for dir_entry in fs::read_dir(&self.dir).map_err(|e| VigilError::storage(&self.dir, e))? {
            let dir_entry = dir_entry.map_err(|e| VigilError::storage(&self.dir, e))?;
            let name = dir_entry.file_name();
            if let Some(created_at) = name.to_str().and_then(parse_key_file_name) {
                files.push(KeyFile {
                    path: dir_entry.path(),
                    created_at,
                });
            }
        }
        files.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.path.cmp(&b.path)));
        Ok(files)
    }

    /// Most recently created key file, if any
    pub fn latest(&self) -> Result<Option<KeyFile>> {
        Ok(self.list()?.pop())
    }
}

/// File name for a key created at `created_at`; `attempt` > 0 adds a suffix
fn key_file_name(created_at: &NaiveDateTime, attempt: u32) -> String {
    let stamp = created_at.format(KEY_STAMP_FORMAT);
    if attempt == 0 {
        format!("{KEY_PREFIX}{stamp}{KEY_EXTENSION}")
    } else {
        format!("{KEY_PREFIX}{stamp}_{attempt}{KEY_EXTENSION}")
    }
}

/// Extracts the creation time from a key file name
///
/// Accepts `key_YYYYMMDD_HHMMSS.key` and `key_YYYYMMDD_HHMMSS_<n>.key`.
pub fn parse_key_file_name(name: &str) -> Option<NaiveDateTime> {
    let body = name.strip_prefix(KEY_PREFIX)?.strip_suffix(KEY_EXTENSION)?;
    if body.len() < KEY_STAMP_LEN || !body.is_char_boundary(KEY_STAMP_LEN) {
        return None;
    }
    let (stamp, rest) = body.split_at(KEY_STAMP_LEN);
    if !rest.is_empty() {
        let suffix = rest.strip_prefix('_')?;
        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }
    NaiveDateTime::parse_from_str(stamp, KEY_STAMP_FORMAT).ok()
}
