//! Log entry model
//!
//! [`LogEntry`] is the unit persisted to the encrypted stream. [`RedactedEntry`]
//! is the projection written to the plaintext stream; it has no payload fields
//! at all, so a redacted line can never carry `content` or `additional_data`.

use super::ids::EventId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anonymized view of the user behind an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizedUser {
    /// Token for the user identifier
    pub id_anon: String,
    /// Token for the username
    pub username_anon: String,
    /// Token for the first name
    pub first_name_anon: String,
    /// Token for the last name
    pub last_name_anon: String,
    /// Language code, carried through unmodified
    pub language_code: String,
    /// Bot flag, carried through unmodified
    pub is_bot: bool,
}

/// Where an event came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Fixed platform tag
    pub platform: String,
    /// Client application tag
    pub client: String,
    /// Source channel tag
    pub source: String,
}

/// A complete audit log entry
///
/// `content` and `additional_data` hold ciphertext text (or are empty); they
/// are encrypted by the pipeline before the entry is assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// UTC creation instant
    pub timestamp: DateTime<Utc>,
    /// Correlation identifier
    pub event_id: EventId,
    /// Caller-supplied classification
    pub event_type: String,
    /// Anonymized user
    pub user: AnonymizedUser,
    /// Platform, client and source tags
    pub metadata: EntryMetadata,
    /// Encrypted free-text payload, empty when none was given
    #[serde(default)]
    pub content: String,
    /// Encrypted structured payload, empty when none was given
    #[serde(default)]
    pub additional_data: String,
}

impl LogEntry {
    /// Projects the entry onto the fields safe for the plaintext stream
    pub fn redacted(&self) -> RedactedEntry {
        RedactedEntry {
            timestamp: self.timestamp,
            event_id: self.event_id.clone(),
            event_type: self.event_type.clone(),
            user: self.user.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Whether a free-text payload was recorded
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// Whether a structured payload was recorded
    pub fn has_additional_data(&self) -> bool {
        !self.additional_data.is_empty()
    }
}

/// A log entry without its sensitive payload fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactedEntry {
    /// UTC creation instant
    pub timestamp: DateTime<Utc>,
    /// Correlation identifier
    pub event_id: EventId,
    /// Caller-supplied classification
    pub event_type: String,
    /// Anonymized user
    pub user: AnonymizedUser,
    /// Platform, client and source tags
    pub metadata: EntryMetadata,
}
