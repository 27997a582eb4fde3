//! Read command implementation
//!
//! Prints one partition as JSON lines on stdout. Reading never writes key
//! files.

use super::{load_config_or_report, EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::core::pipeline::{resolve_read_cipher, AuditPipeline};
use crate::crypto::{generate_key, Cipher};
use crate::domain::{LogEntry, PartitionDate, Result};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

/// Arguments for the read command
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Partition date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    pub date: Option<String>,

    /// Read the encrypted stream instead of the redacted one
    #[arg(long)]
    pub decrypt: bool,

    /// Decrypt payload fields too (implies --decrypt)
    #[arg(long)]
    pub reveal: bool,

    /// Key file to decrypt with; defaults to the configured key, then the
    /// newest key file in the store
    #[arg(long)]
    pub key_file: Option<PathBuf>,
}

impl ReadArgs {
    /// Execute the read command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let date = self
            .date
            .clone()
            .unwrap_or_else(|| PartitionDate::today().to_string());
        let decrypt = self.decrypt || self.reveal;

        let cipher = match resolve_read_cipher(&config, self.key_file.as_deref()) {
            Ok(Some(cipher)) => cipher,
            // the redacted stream needs no key
            Ok(None) if !decrypt => Cipher::from_key(generate_key()),
            Ok(None) => {
                eprintln!("❌ No key available; pass --key-file or configure [encryption]");
                return Ok(EXIT_CONFIG);
            }
            Err(e) => {
                eprintln!("❌ Failed to load key");
                eprintln!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        let key_count = cipher.decryption_key_count();
        let pipeline = AuditPipeline::for_reading(&config, cipher);

        tracing::info!(date = %date, decrypt, reveal = self.reveal, "Reading partition");

        let lines = if self.reveal {
            pipeline
                .read_entries(&date)
                .and_then(|entries| revealed_lines(&pipeline, &entries))
        } else {
            pipeline.read_logs(&date, decrypt)
        };

        match lines {
            Ok(lines) => {
                for line in &lines {
                    println!("{}", serde_json::to_string(line)?);
                }
                eprintln!("✅ {} entries read from {date}", lines.len());
                if decrypt {
                    eprintln!(
                        "   Decrypted with {key_count} key(s); records sealed under any other key are skipped"
                    );
                }
                Ok(EXIT_OK)
            }
            Err(e @ crate::domain::VigilError::InvalidDate(_)) => {
                eprintln!("❌ {e}");
                Ok(EXIT_CONFIG)
            }
            Err(e) => {
                eprintln!("❌ Failed to read partition {date}");
                eprintln!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}

/// Entries with their payload fields replaced by plaintext
fn revealed_lines(pipeline: &AuditPipeline, entries: &[LogEntry]) -> Result<Vec<Value>> {
    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let payload = match pipeline.reveal(entry) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(event_id = %entry.event_id, error = %e, "Payload could not be revealed");
                continue;
            }
        };

        let mut line = serde_json::to_value(entry)?;
        if let Value::Object(fields) = &mut line {
            fields.insert(
                "content".to_string(),
                payload.content.map_or(Value::Null, Value::String),
            );
            fields.insert(
                "additional_data".to_string(),
                payload.additional_data.map_or(Value::Null, Value::Object),
            );
        }
        lines.push(line);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserAttributes;
    use crate::storage::StorageLayout;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_revealed_lines_replace_payloads() {
        let dir = tempfile::TempDir::new().unwrap();
        let pipeline = AuditPipeline::new(
            StorageLayout::new(dir.path()),
            Arc::new(Cipher::from_key(generate_key())),
            "telegram",
        );
        let data = json!({"chat": 7});
        pipeline
            .log_event("message", &UserAttributes::with_id(1), "hello", data.as_object())
            .unwrap();
        pipeline
            .log_event("join", &UserAttributes::with_id(2), "", None)
            .unwrap();

        let today = PartitionDate::today().to_string();
        let entries = pipeline.read_entries(&today).unwrap();
        let lines = revealed_lines(&pipeline, &entries).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["content"], "hello");
        assert_eq!(lines[0]["additional_data"], data);
        assert_eq!(lines[1]["content"], Value::Null);
        assert_eq!(lines[1]["additional_data"], Value::Null);
    }
}
