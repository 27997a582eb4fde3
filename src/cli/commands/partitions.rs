//! Partitions command implementation

use super::{load_config_or_report, EXIT_FATAL, EXIT_OK};
use crate::domain::{PartitionDate, Result, VigilError};
use crate::storage::StorageLayout;
use clap::Args;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Arguments for the partitions command
#[derive(Args, Debug)]
pub struct PartitionsArgs {}

/// Sizes of the two streams of one partition; `None` when a file is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PartitionSizes {
    date: PartitionDate,
    raw_bytes: Option<u64>,
    encrypted_bytes: Option<u64>,
}

impl PartitionsArgs {
    /// Execute the partitions command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let layout = StorageLayout::new(&config.storage.root);
        let partitions = match sizes(&layout) {
            Ok(p) => p,
            Err(e) => {
                println!("❌ Failed to list partitions");
                println!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        println!("📅 Partitions under {}", layout.root().display());
        println!();
        if partitions.is_empty() {
            println!("No partitions found.");
            return Ok(EXIT_OK);
        }

        println!("{:<12} {:>12} {:>12}", "Date", "Redacted", "Encrypted");
        for partition in &partitions {
            println!(
                "{:<12} {:>12} {:>12}",
                partition.date.to_string(),
                size_label(partition.raw_bytes),
                size_label(partition.encrypted_bytes)
            );
        }
        println!();
        println!("Total: {} partitions", partitions.len());
        Ok(EXIT_OK)
    }
}

fn size_label(bytes: Option<u64>) -> String {
    bytes.map_or_else(|| "-".to_string(), |b| format!("{b} B"))
}

fn file_size(path: &Path) -> Result<Option<u64>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata.len())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(VigilError::storage(path, e)),
    }
}

fn sizes(layout: &StorageLayout) -> Result<Vec<PartitionSizes>> {
    layout
        .partitions()?
        .into_iter()
        .map(|date| {
            Ok(PartitionSizes {
                date,
                raw_bytes: file_size(&layout.raw_path(date))?,
                encrypted_bytes: file_size(&layout.encrypted_path(date))?,
            })
        })
        .collect()
}
