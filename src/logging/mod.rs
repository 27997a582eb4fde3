//! Logging and observability
//!
//! Diagnostics go through `tracing`. The subscriber is installed once by the
//! binary via [`init_logging`]; library code only emits events.
//!
//! # Example
//!
//! ```no_run
//! use vigil::logging::init_logging;
//! use vigil::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log a recorded audit event
///
/// Only the event ID, type and partition are logged, never payloads.
///
/// # Example
///
/// ```no_run
/// use vigil::log_event_recorded;
/// use vigil::domain::{EventId, PartitionDate};
///
/// let event_id = EventId::new("0123456789ab").unwrap();
/// log_event_recorded!(&event_id, "message", PartitionDate::today());
/// ```
#[macro_export]
macro_rules! log_event_recorded {
    ($event_id:expr, $event_type:expr, $partition:expr) => {
        tracing::info!(
            event_id = %$event_id,
            event_type = $event_type,
            partition = %$partition,
            "Audit event recorded"
        );
    };
}

/// Log a stored record that could not be decoded and was skipped
///
/// # Example
///
/// ```no_run
/// use vigil::log_record_skipped;
/// use vigil::domain::VigilError;
/// use std::path::Path;
///
/// let error = VigilError::Decryption("authentication tag mismatch".to_string());
/// log_record_skipped!(Path::new("logs/encrypted/2025-01-31.enc"), 3, error);
/// ```
#[macro_export]
macro_rules! log_record_skipped {
    ($path:expr, $index:expr, $error:expr) => {
        tracing::warn!(
            path = %$path.display(),
            record = $index,
            error = %$error,
            "Skipping unreadable record"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use vigil::log_error_with_context;
/// use vigil::domain::VigilError;
///
/// let error = VigilError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
