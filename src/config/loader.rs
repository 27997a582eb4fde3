//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::VigilConfig;
use super::secret::secret_string;
use crate::domain::errors::VigilError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "VIGIL_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into VigilConfig
/// 4. Applies environment variable overrides (VIGIL_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `Configuration` if the file cannot be read or parsed, a
/// referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use vigil::config::loader::load_config;
///
/// let config = load_config("vigil.toml").expect("Failed to load config");
/// println!("Storage root: {}", config.storage.root);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<VigilConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(VigilError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        VigilError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, applying substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<VigilConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: VigilConfig = toml::from_str(&contents)?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        VigilError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| VigilError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                if !missing_vars.iter().any(|v| v == var_name) {
                    missing_vars.push(var_name.to_string());
                }
                String::new()
            })
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(VigilError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_override(section: &str, key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{section}_{key}")).ok()
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        VigilError::Configuration(format!("Invalid value '{value}' for {ENV_PREFIX}{name}"))
    })
}

/// Applies environment variable overrides using VIGIL_* prefix
///
/// Environment variables follow the pattern: VIGIL_<SECTION>_<KEY>
/// For example: VIGIL_STORAGE_ROOT, VIGIL_RETENTION_MAX_AGE_DAYS
///
/// # Errors
///
/// Returns `Configuration` when a numeric or boolean override does not parse
fn apply_env_overrides(config: &mut VigilConfig) -> Result<()> {
    if let Some(val) = env_override("APPLICATION", "LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Some(val) = env_override("STORAGE", "ROOT") {
        config.storage.root = val;
    }

    if let Some(val) = env_override("ENCRYPTION", "KEY") {
        config.encryption.key = Some(secret_string(val));
    }
    if let Some(val) = env_override("ENCRYPTION", "KEY_FILE") {
        config.encryption.key_file = Some(val);
    }

    if let Some(val) = env_override("METADATA", "PLATFORM") {
        config.metadata.platform = val;
    }

    if let Some(val) = env_override("RETENTION", "MAX_AGE_DAYS") {
        config.retention.max_age_days = parse_override("RETENTION_MAX_AGE_DAYS", &val)?;
    }
    if let Some(val) = env_override("RETENTION", "CLEANUP_INTERVAL_HOURS") {
        config.retention.cleanup_interval_hours =
            parse_override("RETENTION_CLEANUP_INTERVAL_HOURS", &val)?;
    }

    if let Some(val) = env_override("LOGGING", "LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env_override("LOGGING", "LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_override("LOGGING", "LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
