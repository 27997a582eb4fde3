//! Payload encryption and key material
//!
//! One [`Cipher`] exists per process. It is created with
//! [`Cipher::initialize`], which persists its key to the [`KeyStore`]; every
//! other component receives it by `Arc`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::crypto::Cipher;
//! use vigil::storage::StorageLayout;
//!
//! # fn example() -> vigil::domain::Result<()> {
//! let layout = StorageLayout::new("logs");
//! let cipher = Arc::new(Cipher::initialize(&layout, None)?);
//! let sealed = cipher.encrypt(b"payload")?;
//! assert_eq!(cipher.decrypt(&sealed)?, b"payload");
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod key_store;

pub use cipher::{decode_key, generate_key, Cipher, KeyMaterial};
pub use key_store::{parse_key_file_name, KeyFile, KeyStore};
