//! Configuration schema definitions
//!
//! Every section is optional in the TOML file; missing sections and fields
//! take the defaults below.

use super::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VigilConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Where partitions and key files live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Key source
    #[serde(default)]
    pub encryption: EncryptionConfig,

    /// Tags stamped on every entry
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Retention of partitions and key files
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Diagnostic logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VigilConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.storage.validate()?;
        self.encryption.validate()?;
        self.metadata.validate()?;
        self.retention.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding `raw/`, `encrypted/` and `keys/`
    #[serde(default = "default_storage_root")]
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.root.trim().is_empty() {
            return Err("storage.root cannot be empty".to_string());
        }
        Ok(())
    }

    /// Root directory as a path
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }
}

/// Encryption key source
///
/// At most one of `key` and `key_file` may be set. With neither, a fresh key
/// is generated for each process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncryptionConfig {
    /// Key text (URL-safe base64 of 32 bytes)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub key: Option<SecretString>,

    /// Path of a key file whose content is the key text
    #[serde(default)]
    pub key_file: Option<String>,
}

impl EncryptionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.key.is_some() && self.key_file.is_some() {
            return Err("encryption.key and encryption.key_file are mutually exclusive".to_string());
        }
        if let Some(path) = &self.key_file {
            if path.trim().is_empty() {
                return Err("encryption.key_file cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

/// Entry metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Platform tag written to every entry
    #[serde(default = "default_platform")]
    pub platform: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
        }
    }
}

impl MetadataConfig {
    fn validate(&self) -> Result<(), String> {
        if self.platform.trim().is_empty() {
            return Err("metadata.platform cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Retention configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Files older than this many days are purged
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,

    /// Interval between periodic purges, in hours
    #[serde(default = "default_cleanup_interval_hours")]
    pub cleanup_interval_hours: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
            cleanup_interval_hours: default_cleanup_interval_hours(),
        }
    }
}

impl RetentionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_age_days == 0 {
            return Err("retention.max_age_days must be > 0".to_string());
        }
        if self.cleanup_interval_hours == 0 {
            return Err("retention.cleanup_interval_hours must be > 0".to_string());
        }
        Ok(())
    }

    /// Interval between periodic purges
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_hours * 3600)
    }
}

/// Diagnostic logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage_root() -> String {
    "logs".to_string()
}

fn default_platform() -> String {
    "telegram".to_string()
}

fn default_max_age_days() -> u32 {
    30
}

fn default_cleanup_interval_hours() -> u64 {
    24
}

fn default_local_path() -> String {
    "/var/log/vigil".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = VigilConfig::default();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.storage.root, "logs");
        assert_eq!(config.metadata.platform, "telegram");
        assert_eq!(config.retention.max_age_days, 30);
        assert_eq!(config.retention.cleanup_interval(), Duration::from_secs(86_400));
        assert!(!config.logging.local_enabled);
        assert!(config.encryption.key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: VigilConfig = toml::from_str("").unwrap();
        assert_eq!(config.storage.root, "logs");
        assert_eq!(config.logging.local_rotation, "daily");
    }

    #[test_case("verbose" ; "unknown level")]
    #[test_case("INFO" ; "uppercase level")]
    fn test_invalid_log_level(level: &str) {
        let mut config = VigilConfig::default();
        config.application.log_level = level.to_string();
        assert!(config.validate().unwrap_err().contains("log_level"));
    }

    #[test]
    fn test_key_sources_are_exclusive() {
        let mut config = VigilConfig::default();
        config.encryption.key = Some(secret_string("k".to_string()));
        config.encryption.key_file = Some("keys/key.key".to_string());
        assert!(config.validate().unwrap_err().contains("mutually exclusive"));
    }

    #[test]
    fn test_zero_retention_rejected() {
        let mut config = VigilConfig::default();
        config.retention.max_age_days = 0;
        assert!(config.validate().is_err());

        let mut config = VigilConfig::default();
        config.retention.cleanup_interval_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test_case("daily", true)]
    #[test_case("hourly", true)]
    #[test_case("never", true)]
    #[test_case("size", false)]
    fn test_rotation_values(rotation: &str, valid: bool) {
        let mut config = VigilConfig::default();
        config.logging.local_rotation = rotation.to_string();
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[test]
    fn test_empty_root_and_platform_rejected() {
        let mut config = VigilConfig::default();
        config.storage.root = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = VigilConfig::default();
        config.metadata.platform = String::new();
        assert!(config.validate().is_err());
    }
}
