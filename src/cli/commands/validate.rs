//! Validate config command implementation

use super::{EXIT_CONFIG, EXIT_OK};
use crate::config::{load_config, VigilConfig};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates; a failure here covers parse and validation errors
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        for line in summary(&config) {
            println!("  {line}");
        }
        println!();
        Ok(EXIT_OK)
    }
}

fn summary(config: &VigilConfig) -> Vec<String> {
    let key_source = match (&config.encryption.key, &config.encryption.key_file) {
        (Some(_), _) => "configured key".to_string(),
        (None, Some(path)) => format!("key file {path}"),
        (None, None) => "generated per process".to_string(),
    };

    let mut lines = vec![
        format!("Log Level: {}", config.application.log_level),
        format!("Storage Root: {}", config.storage.root),
        format!("Key Source: {key_source}"),
        format!("Platform: {}", config.metadata.platform),
        format!("Retention: {} days", config.retention.max_age_days),
        format!(
            "Cleanup Interval: {} hours",
            config.retention.cleanup_interval_hours
        ),
    ];
    if config.logging.local_enabled {
        lines.push(format!(
            "Log Files: {} ({})",
            config.logging.local_path, config.logging.local_rotation
        ));
    }
    lines
}
