//! User attributes supplied by the event producer
//!
//! These are consumed once per `log_event` call and never stored in raw form.

use serde::{Deserialize, Serialize};

/// Identifying and descriptive attributes of the user behind an event
///
/// Deserializes from the mapping an event producer hands over, e.g.
/// `{"id": 123, "username": "alice", "is_bot": false}`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttributes {
    /// Numeric user identifier on the source platform
    #[serde(default)]
    pub id: Option<i64>,

    /// Account handle
    #[serde(default)]
    pub username: Option<String>,

    /// Given name
    #[serde(default)]
    pub first_name: Option<String>,

    /// Family name
    #[serde(default)]
    pub last_name: Option<String>,

    /// IETF language tag reported by the client
    #[serde(default)]
    pub language_code: Option<String>,

    /// Whether the account is automated
    #[serde(default)]
    pub is_bot: bool,

    /// Client application tag
    #[serde(default)]
    pub client: Option<String>,

    /// Source channel tag
    #[serde(default)]
    pub source: Option<String>,
}

impl UserAttributes {
    /// Creates attributes carrying only an identifier
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// The identifier rendered as text, empty when absent
    pub fn id_text(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }
}
