//! Purge command implementation
//!
//! One-shot purge by default; `--watch` keeps purging on the configured
//! interval until Ctrl+C or SIGTERM.

use super::{load_config_or_report, EXIT_FATAL, EXIT_OK};
use crate::core::retention::{PurgeReport, RetentionManager, RetentionPolicy};
use crate::storage::StorageLayout;
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the purge command
#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Maximum age in days, defaults to `[retention] max_age_days`
    #[arg(long)]
    pub days: Option<u32>,

    /// Keep running and purge on `[retention] cleanup_interval_hours`
    #[arg(long)]
    pub watch: bool,
}

impl PurgeArgs {
    /// Execute the purge command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load_config_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let days = self.days.unwrap_or(config.retention.max_age_days);
        let manager = RetentionManager::new(StorageLayout::new(&config.storage.root));

        if self.watch {
            let policy =
                RetentionPolicy::days(days).cleanup_interval(config.retention.cleanup_interval());
            println!(
                "🧹 Purging files older than {days} days every {} hours (Ctrl+C to stop)",
                config.retention.cleanup_interval_hours
            );
            Arc::new(manager).run_periodic(policy, shutdown_signal).await;
            println!("✅ Retention stopped");
            return Ok(EXIT_OK);
        }

        println!("🧹 Purging files older than {days} days");
        match manager.purge(days) {
            Ok(report) => {
                print_report(&report);
                Ok(EXIT_OK)
            }
            Err(e) => {
                crate::log_error_with_context!(&e, "Purge failed");
                println!("❌ Purge failed");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}

fn print_report(report: &PurgeReport) {
    println!("✅ Purge complete");
    println!("  Removed: {}", report.removed.len());
    for path in &report.removed {
        println!("    - {}", path.display());
    }
    println!("  Retained: {}", report.retained);
    if !report.skipped.is_empty() {
        println!("  Unrecognized (left in place): {}", report.skipped.len());
        for path in &report.skipped {
            println!("    ? {}", path.display());
        }
    }
}
