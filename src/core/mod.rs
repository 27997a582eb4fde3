//! Core logging pipeline for Vigil.
//!
//! # Modules
//!
//! - [`pipeline`] - Entry assembly, encryption, persistence and read-back
//! - [`retention`] - Age-based deletion of partitions and key files
//!
//! # Logging Workflow
//!
//! 1. **Anonymize**: Replace identifying user fields by hash tokens
//! 2. **Encrypt**: Seal the free-text and structured payloads
//! 3. **Assemble**: Build the entry with a fresh event ID and UTC timestamp
//! 4. **Persist**: Append the redacted line and the encrypted record
//!
//! # Example
//!
//! ```rust,no_run
//! use vigil::config::load_config;
//! use vigil::core::pipeline::AuditPipeline;
//! use vigil::domain::UserAttributes;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vigil.toml")?;
//! let pipeline = AuditPipeline::from_config(&config)?;
//!
//! let user = UserAttributes {
//!     username: Some("alice".to_string()),
//!     ..UserAttributes::with_id(123)
//! };
//! let event_id = pipeline.log_event("message", &user, "hello", None)?;
//! println!("Recorded {event_id}");
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod retention;

pub use pipeline::{AuditPipeline, RevealedPayload};
pub use retention::{FileStamp, PurgeReport, RetentionManager, RetentionPolicy, StorageArea};
