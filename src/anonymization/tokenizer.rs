//! Hash tokenization strategy

use super::{Anonymizer, ANONYMOUS_TOKEN, TOKEN_LEN};
use sha2::{Digest, Sha256};

/// Tokenization strategy - replaces a value with a truncated SHA-256 digest
///
/// The same input always yields the same token, so events from one user can be
/// correlated without the identity being recoverable.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashTokenizer;

impl HashTokenizer {
    /// Create a new hash tokenizer
    pub fn new() -> Self {
        Self
    }
}

impl Anonymizer for HashTokenizer {
    fn anonymize(&self, raw: &str) -> String {
        if raw.is_empty() {
            return ANONYMOUS_TOKEN.to_string();
        }
        digest_prefix(raw.as_bytes(), TOKEN_LEN)
    }
}

/// First `len` lowercase hex characters of the SHA-256 digest of `data`
pub fn digest_prefix(data: &[u8], len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(len);
    hex
}
