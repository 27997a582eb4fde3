//! Configuration management for Vigil.
//!
//! # Overview
//!
//! Vigil uses a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `VIGIL_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vigil::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vigil.toml")?;
//! println!("Storage root: {}", config.storage.root);
//! println!("Retention: {} days", config.retention.max_age_days);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`StorageConfig`] - Storage root directory
//! - [`EncryptionConfig`] - Key text or key file
//! - [`MetadataConfig`] - Platform tag
//! - [`RetentionConfig`] - Maximum age and purge interval
//! - [`LoggingConfig`] - Diagnostic log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [storage]
//! root = "/srv/vigil"
//!
//! [encryption]
//! key = "${VIGIL_KEY}"
//!
//! [retention]
//! max_age_days = 30
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, EncryptionConfig, LoggingConfig, MetadataConfig, RetentionConfig,
    StorageConfig, VigilConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
