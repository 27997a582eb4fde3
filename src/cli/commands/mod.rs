//! CLI command implementations
//!
//! Every command returns an exit code: 0 on success, 2 for configuration or
//! input errors, 5 for fatal errors.

pub mod init;
pub mod keys;
pub mod log;
pub mod partitions;
pub mod purge;
pub mod read;
pub mod validate;

use crate::config::{load_config, VigilConfig};

/// Exit code for success
pub const EXIT_OK: i32 = 0;
/// Exit code for configuration or input errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for fatal errors
pub const EXIT_FATAL: i32 = 5;

/// Load the configuration, printing the failure for the user
///
/// On failure the error carries the exit code to return.
pub(crate) fn load_config_or_report(config_path: &str) -> Result<VigilConfig, i32> {
    load_config(config_path).map_err(|e| {
        println!("❌ Failed to load configuration file");
        println!("   Error: {e}");
        EXIT_CONFIG
    })
}
