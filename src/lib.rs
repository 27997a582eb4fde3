// Vigil - Encrypted, Anonymizing Audit Log
// Copyright (c) 2025 Vigil Contributors
// Licensed under the MIT License

//! # Vigil - Encrypted, Anonymizing Audit Log
//!
//! Vigil records application events (typically chat-bot interactions) to a
//! local, date-partitioned audit log. Every event is written twice:
//!
//! - a **redacted stream** of plaintext JSON lines with anonymized user fields
//!   and no payloads, for operational inspection
//! - an **encrypted stream** of AES-256-GCM records holding the full entry,
//!   recoverable only with the process key
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Audit pipeline and retention
//! - [`anonymization`] - Hash tokens for identifying fields
//! - [`crypto`] - Cipher and key store
//! - [`storage`] - Partition layout, framing and the log store
//! - [`domain`] - Entry model, identifiers and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::core::AuditPipeline;
//! use vigil::crypto::Cipher;
//! use vigil::domain::UserAttributes;
//! use vigil::storage::StorageLayout;
//!
//! # fn example() -> vigil::domain::Result<()> {
//! let layout = StorageLayout::new("logs");
//! let cipher = Arc::new(Cipher::initialize(&layout, None)?);
//! let pipeline = AuditPipeline::new(layout, cipher, "telegram");
//!
//! let user = UserAttributes {
//!     username: Some("alice".to_string()),
//!     ..UserAttributes::with_id(123)
//! };
//! let event_id = pipeline.log_event("message", &user, "hello", None)?;
//!
//! let today = vigil::domain::PartitionDate::today().to_string();
//! for entry in pipeline.read_entries(&today)? {
//!     let payload = pipeline.reveal(&entry)?;
//!     println!("{} {:?}", entry.event_id, payload.content);
//! }
//! # let _ = event_id;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`] with [`domain::VigilError`].
//! Bulk reads skip individual unreadable records with a warning rather than
//! failing the whole read.

pub mod anonymization;
pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod domain;
pub mod logging;
pub mod storage;
