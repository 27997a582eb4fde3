//! Date-partitioned persistence for audit entries
//!
//! - [`layout`] - where the redacted stream, encrypted stream and keys live
//! - [`framing`] - length-prefixed records of the encrypted stream
//! - [`store`] - append and read of one partition

pub mod framing;
pub mod layout;
pub mod store;

pub use layout::{parse_partition_file_name, StorageLayout};
pub use store::LogStore;
