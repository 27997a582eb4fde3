//! Anonymization of identifying fields
//!
//! Every identifying user field is replaced by a short, irreversible token
//! before an entry is assembled. Tokens are deterministic, so one user's events
//! stay correlated across entries and across process restarts.
//!
//! # Usage
//!
//! ```rust
//! use vigil::anonymization::{anonymize, ANONYMOUS_TOKEN};
//!
//! let token = anonymize("alice");
//! assert_eq!(token.len(), 12);
//! assert_eq!(anonymize(""), ANONYMOUS_TOKEN);
//! ```

pub mod tokenizer;

pub use tokenizer::{digest_prefix, HashTokenizer};

/// Token substituted for empty values
pub const ANONYMOUS_TOKEN: &str = "anonymous";

/// Length of a hash token in hex characters
pub const TOKEN_LEN: usize = 12;

/// Trait for anonymization strategy implementations
pub trait Anonymizer: Send + Sync {
    /// Anonymize a raw identifying value
    fn anonymize(&self, raw: &str) -> String;
}

/// Anonymize a value with the default [`HashTokenizer`] strategy
pub fn anonymize(raw: &str) -> String {
    HashTokenizer.anonymize(raw)
}
