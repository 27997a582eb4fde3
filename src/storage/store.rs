//! Partitioned log store
//!
//! Appends each entry to two per-day files: a redacted NDJSON line and an
//! encrypted, length-prefixed frame holding the full entry. Reads return one
//! day's entries in write order, skipping individual records that cannot be
//! decoded.

use super::framing::{encode_frame, Frame, FrameReader};
use super::layout::StorageLayout;
use crate::crypto::Cipher;
use crate::domain::{LogEntry, PartitionDate, RedactedEntry, Result, VigilError};
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Durable, date-partitioned storage for log entries
#[derive(Debug)]
pub struct LogStore {
    layout: StorageLayout,
    cipher: Arc<Cipher>,
    /// Serializes the open/write/sync sequence of every append
    write_lock: Mutex<()>,
}

impl LogStore {
    /// Create a store over `layout` that seals records with `cipher`
    pub fn new(layout: StorageLayout, cipher: Arc<Cipher>) -> Self {
        Self {
            layout,
            cipher,
            write_lock: Mutex::new(()),
        }
    }

    /// The storage layout
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Append an entry to both streams of its partition
    ///
    /// The partition is the local calendar date of `entry.timestamp`. Both
    /// records are serialized and the full one encrypted before any file is
    /// opened, so a serialization or encryption failure leaves disk untouched.
    /// If the encrypted write fails after the redacted line went out, the
    /// redacted file is cut back to its previous length.
    ///
    /// # Errors
    ///
    /// Returns `Storage` when either file cannot be written or synced; the
    /// event is then not recorded in either stream.
    pub fn append(&self, entry: &LogEntry) -> Result<PartitionDate> {
        let date = PartitionDate::of_instant(&entry.timestamp);

        let mut redacted_line = serde_json::to_vec(&entry.redacted())?;
        redacted_line.push(b'\n');

        let full = serde_json::to_vec(entry)?;
        let sealed = self.cipher.encrypt(&full)?;
        let frame = encode_frame(&sealed)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| VigilError::Storage(format!("Failed to acquire log write lock: {e}")))?;

        let raw_path = self.layout.raw_path(date);
        let raw_len = existing_len(&raw_path)?;

        append_bytes(&raw_path, &redacted_line)?;
        if let Err(e) = append_bytes(&self.layout.encrypted_path(date), &frame) {
            restore_len(&raw_path, raw_len);
            return Err(e);
        }

        debug!(
            event_id = %entry.event_id,
            partition = %date,
            "Entry appended"
        );
        Ok(date)
    }

    /// Read a partition as JSON values
    ///
    /// With `decrypt` false this is the redacted stream; with `decrypt` true
    /// it is the decrypted full stream (whose `content` and
    /// `additional_data` fields are still ciphertext text).
    pub fn read(&self, date: PartitionDate, decrypt: bool) -> Result<Vec<serde_json::Value>> {
        if decrypt {
            self.read_decrypted(date)?
                .iter()
                .map(|entry| serde_json::to_value(entry).map_err(VigilError::from))
                .collect()
        } else {
            self.read_redacted(date)?
                .iter()
                .map(|entry| serde_json::to_value(entry).map_err(VigilError::from))
                .collect()
        }
    }

    /// Read the redacted stream of a partition
    ///
    /// Blank lines are ignored and malformed lines are skipped with a
    /// warning. A partition with no file yields an empty list.
    pub fn read_redacted(&self, date: PartitionDate) -> Result<Vec<RedactedEntry>> {
        let path = self.layout.raw_path(date);
        let Some(contents) = read_partition(&path)? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for (index, line) in contents.split(|b| *b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match parse_record::<RedactedEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    crate::log_record_skipped!(&path, index, e);
                }
            }
        }
        Ok(entries)
    }

    /// Read and decrypt the encrypted stream of a partition
    ///
    /// A frame that fails to decrypt or parse is skipped with a warning, as
    /// is a damaged region between frames; reading resumes at the next frame.
    /// A truncated final frame ends the scan with a warning. A partition with
    /// no file yields an empty list.
    pub fn read_decrypted(&self, date: PartitionDate) -> Result<Vec<LogEntry>> {
        let path = self.layout.encrypted_path(date);
        let Some(contents) = read_partition(&path)? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for (index, frame) in FrameReader::new(&contents).enumerate() {
            match frame {
                Frame::Complete([]) => continue,
                Frame::Complete(sealed) => {
                    let decoded = self
                        .cipher
                        .decrypt(sealed)
                        .and_then(|plaintext| parse_record::<LogEntry>(&plaintext));
                    match decoded {
                        Ok(entry) => entries.push(entry),
                        Err(e) => {
                            crate::log_record_skipped!(&path, index, e);
                        }
                    }
                }
                Frame::Corrupt { offset, skipped } => {
                    warn!(
                        path = %path.display(),
                        offset,
                        skipped,
                        "Skipped unreadable bytes in encrypted partition, resuming at next record"
                    );
                }
                Frame::Truncated {
                    offset,
                    declared,
                    available,
                } => {
                    warn!(
                        path = %path.display(),
                        offset,
                        declared = ?declared,
                        available,
                        "Encrypted partition ends inside a record, remaining bytes not read"
                    );
                }
            }
        }
        Ok(entries)
    }

    /// Dates that have at least one partition file, oldest first
    pub fn partitions(&self) -> Result<Vec<PartitionDate>> {
        self.layout.partitions()
    }
}

/// Append `bytes` to `path`, creating the file if needed
///
/// A failed write or sync cuts the file back to its length at open.
fn append_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| VigilError::storage(path, e))?;
    let prior = file
        .metadata()
        .map_err(|e| VigilError::storage(path, e))?
        .len();

    let written = file.write_all(bytes).and_then(|()| file.sync_data());
    if let Err(e) = written {
        if let Err(cut) = file.set_len(prior) {
            warn!(path = %path.display(), error = %cut, "Failed to discard partial write");
        }
        return Err(VigilError::storage(path, e));
    }
    Ok(())
}

/// Length of an existing partition file, `None` if there is none yet
fn existing_len(path: &Path) -> Result<Option<u64>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata.len())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(VigilError::storage(path, e)),
    }
}

/// Undo an append: cut the file back to `len`, or remove it if it was new
fn restore_len(path: &Path, len: Option<u64>) {
    let restored = match len {
        Some(len) => OpenOptions::new()
            .write(true)
            .open(path)
            .and_then(|file| file.set_len(len).and_then(|()| file.sync_data())),
        None => fs::remove_file(path),
    };
    if let Err(e) = restored {
        warn!(path = %path.display(), error = %e, "Failed to roll back redacted record");
    }
}

/// Whole contents of a partition file, `None` if it doesn't exist
fn read_partition(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(VigilError::storage(path, e)),
    }
}

fn parse_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(VigilError::from)
}
