//! Keys command implementation
//!
//! Lists key files with their creation time. Key text is never printed.

use super::{load_config_or_report, EXIT_FATAL, EXIT_OK};
use crate::crypto::KeyStore;
use crate::storage::StorageLayout;
use clap::Args;

/// Arguments for the keys command
#[derive(Args, Debug)]
pub struct KeysArgs {}

impl KeysArgs {
    /// Execute the keys command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let store = KeyStore::new(StorageLayout::new(&config.storage.root).keys_dir());
        let files = match store.list() {
            Ok(files) => files,
            Err(e) => {
                println!("❌ Failed to list key files");
                println!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        println!("🔑 Key files in {}", store.dir().display());
        println!();
        if files.is_empty() {
            println!("No key files found.");
            return Ok(EXIT_OK);
        }

        for file in &files {
            println!("  {}  {}", file.created_at, file.path.display());
        }
        println!();
        println!("Total: {} key files (newest last)", files.len());
        Ok(EXIT_OK)
    }
}
