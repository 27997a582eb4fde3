//! Init command implementation
//!
//! Writes a starter configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "vigil.toml")]
    pub output: String,

    /// Include comments explaining every setting
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Vigil configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Optionally pin a key: set VIGIL_ENCRYPTION_KEY or [encryption] key_file");
                println!("  3. Validate configuration: vigil validate-config");
                println!("  4. Record an event: vigil log message --content hello");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Vigil Configuration File

[application]
log_level = "info"

[storage]
root = "logs"

[encryption]
# key = "${VIGIL_KEY}"
# key_file = "logs/keys/key_20250101_000000.key"

[metadata]
platform = "telegram"

[retention]
max_age_days = 30
cleanup_interval_hours = 24

[logging]
local_enabled = false
local_path = "/var/log/vigil"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with comments
    fn generate_config_with_examples() -> String {
        r#"# Vigil Configuration File
#
# Every setting can be overridden with VIGIL_<SECTION>_<KEY>, for example
# VIGIL_STORAGE_ROOT or VIGIL_RETENTION_MAX_AGE_DAYS. Values may reference
# environment variables with ${VAR} syntax.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Storage
# ============================================================================
[storage]
# Root directory; raw/, encrypted/ and keys/ are created below it
root = "logs"

# ============================================================================
# Encryption
# ============================================================================
[encryption]
# Set at most one of these. With neither, every process generates a new key
# and writes it to <root>/keys/.
#
# URL-safe base64 text of a 32-byte key (use an environment variable)
# key = "${VIGIL_KEY}"
#
# File whose content is the key text
# key_file = "logs/keys/key_20250101_000000.key"

# ============================================================================
# Entry Metadata
# ============================================================================
[metadata]
# Platform tag written to every entry
platform = "telegram"

# ============================================================================
# Retention
# ============================================================================
[retention]
# Partitions and key files older than this are deleted by `vigil purge`
max_age_days = 30

# Interval of `vigil purge --watch`
cleanup_interval_hours = 24

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON log files (diagnostics only, never audit data)
local_enabled = false

# Local log directory
local_path = "/var/log/vigil"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_generated_configs_parse() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config = parse_config(&content).unwrap();
            assert_eq!(config.storage.root, "logs");
            assert_eq!(config.retention.max_age_days, 30);
        }
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("vigil.toml");
        fs::write(&output, "# existing").unwrap();

        let args = InitArgs {
            output: output.display().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
        assert_eq!(fs::read_to_string(&output).unwrap(), "# existing");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute().await.unwrap(), EXIT_OK);
        assert!(fs::read_to_string(&output).unwrap().contains("[storage]"));
    }
}
