//! Domain error types
//!
//! This module defines the error hierarchy for Vigil. Errors are domain-specific
//! and don't expose third-party types.

use thiserror::Error;

/// Main Vigil error type
///
/// This is the primary error type used throughout the library.
#[derive(Debug, Error)]
pub enum VigilError {
    /// Configuration-related errors (including malformed key material)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Encrypting a payload failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// A ciphertext could not be decrypted (malformed, truncated or foreign key)
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem errors on append, read or delete
    #[error("Storage error: {0}")]
    Storage(String),

    /// A partition date that is not in `YYYY-MM-DD` form
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl VigilError {
    /// Wraps an I/O error with the path it occurred on
    pub fn storage(path: &std::path::Path, err: std::io::Error) -> Self {
        VigilError::Storage(format!("{}: {err}", path.display()))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for VigilError {
    fn from(err: std::io::Error) -> Self {
        VigilError::Storage(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for VigilError {
    fn from(err: serde_json::Error) -> Self {
        VigilError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for VigilError {
    fn from(err: toml::de::Error) -> Self {
        VigilError::Configuration(format!("TOML parse error: {err}"))
    }
}
