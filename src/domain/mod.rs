//! Domain models and types for Vigil.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`EventId`], [`PartitionDate`])
//! - **Entry models** ([`LogEntry`], [`RedactedEntry`], [`AnonymizedUser`])
//! - **Producer input** ([`UserAttributes`])
//! - **Error types** ([`VigilError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, VigilError>`]:
//!
//! ```rust
//! use vigil::domain::{PartitionDate, Result};
//!
//! fn example() -> Result<()> {
//!     let date = PartitionDate::parse("2025-01-31")?;
//!     assert_eq!(date.to_string(), "2025-01-31");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod entry;
pub mod errors;
pub mod ids;
pub mod result;
pub mod user;

// Re-export commonly used types for convenience
pub use entry::{AnonymizedUser, EntryMetadata, LogEntry, RedactedEntry};
pub use errors::VigilError;
pub use ids::{EventId, PartitionDate};
pub use result::Result;
pub use user::UserAttributes;
