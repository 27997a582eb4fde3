//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that flow through the audit log:
//! the per-entry [`EventId`] and the calendar-day [`PartitionDate`].

use super::errors::VigilError;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of hex characters in an event identifier
pub const EVENT_ID_LEN: usize = 12;

/// Date format used for partition file names and `read_logs` arguments
pub const PARTITION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Event identifier newtype wrapper
///
/// A short lowercase hex token that correlates one log entry across the
/// redacted and encrypted streams.
///
/// # Examples
///
/// ```
/// use vigil::domain::ids::EventId;
///
/// let id = EventId::new("0123456789ab").unwrap();
/// assert_eq!(id.as_str(), "0123456789ab");
/// assert!(EventId::new("not-hex").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(String);

impl EventId {
    /// Creates a new EventId, checking length and alphabet
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.len() != EVENT_ID_LEN {
            return Err(format!(
                "Event ID must be {EVENT_ID_LEN} characters, got {}",
                id.len()
            ));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(format!("Event ID must be lowercase hex, got: {id}"));
        }
        Ok(Self(id))
    }

    /// Derives an event ID from the SHA-256 digest of `material`
    pub fn derive(material: &[u8]) -> Self {
        Self(crate::anonymization::digest_prefix(material, EVENT_ID_LEN))
    }

    /// Returns the event ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EventId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A calendar day that names one partition file pair
///
/// Partitions follow the local calendar of the machine writing them.
///
/// # Examples
///
/// ```
/// use vigil::domain::ids::PartitionDate;
///
/// let date = PartitionDate::parse("2025-03-14").unwrap();
/// assert_eq!(date.to_string(), "2025-03-14");
/// assert!(PartitionDate::parse("14/03/2025").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionDate(NaiveDate);

impl PartitionDate {
    /// Parses a `YYYY-MM-DD` string
    pub fn parse(s: &str) -> Result<Self, VigilError> {
        NaiveDate::parse_from_str(s.trim(), PARTITION_DATE_FORMAT)
            .map(Self)
            .map_err(|e| VigilError::InvalidDate(format!("{s}: {e}")))
    }

    /// The partition for the current local day
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// The partition an instant falls into, by local calendar
    pub fn of_instant(instant: &DateTime<Utc>) -> Self {
        Self(instant.with_timezone(&Local).date_naive())
    }

    /// Returns the wrapped date
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Local midnight at the start of the partition
    pub fn start_of_day(&self) -> NaiveDateTime {
        self.0.and_time(chrono::NaiveTime::MIN)
    }
}

impl From<NaiveDate> for PartitionDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for PartitionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(PARTITION_DATE_FORMAT))
    }
}

impl FromStr for PartitionDate {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_id_valid() {
        let id = EventId::new("a1b2c3d4e5f6").unwrap();
        assert_eq!(id.to_string(), "a1b2c3d4e5f6");
        assert_eq!(id.clone().into_inner(), "a1b2c3d4e5f6");
    }

    #[test]
    fn test_event_id_derive() {
        let id = EventId::derive(b"123");
        assert_eq!(id.as_str(), "a665a4592042");
        assert!(EventId::new(id.as_str()).is_ok());
    }

    #[test]
    fn test_event_id_rejects_wrong_length() {
        assert!(EventId::new("abc").is_err());
        assert!(EventId::new("a1b2c3d4e5f6a").is_err());
    }

    #[test]
    fn test_event_id_rejects_uppercase() {
        assert!(EventId::new("A1B2C3D4E5F6").is_err());
    }

    #[test]
    fn test_event_id_serde_validates() {
        let id: EventId = serde_json::from_str("\"0123456789ab\"").unwrap();
        assert_eq!(id.as_str(), "0123456789ab");
        assert!(serde_json::from_str::<EventId>("\"zzz\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0123456789ab\"");
    }

    #[test]
    fn test_partition_date_parse() {
        let date = PartitionDate::parse("2024-02-29").unwrap();
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(PartitionDate::parse("2023-02-29").is_err());
        assert!(PartitionDate::parse("").is_err());
        assert!(matches!(
            PartitionDate::parse("yesterday"),
            Err(VigilError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_partition_date_of_instant_uses_local_calendar() {
        let instant = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let expected = instant.with_timezone(&Local).date_naive();
        assert_eq!(PartitionDate::of_instant(&instant).date(), expected);
    }

    #[test]
    fn test_partition_date_ordering() {
        let earlier = PartitionDate::parse("2025-01-01").unwrap();
        let later = PartitionDate::parse("2025-01-02").unwrap();
        assert!(earlier < later);
        assert!(earlier.start_of_day() < later.start_of_day());
    }
}
