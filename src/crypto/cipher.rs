//! Authenticated encryption of log payloads
//!
//! The cipher is AES-256-GCM with a fresh random 96-bit nonce per message.
//! Ciphertexts are self-contained: `nonce || ciphertext || tag`.

use super::key_store::KeyStore;
use crate::config::{secret_string, SecretString};
use crate::domain::{Result, VigilError};
use crate::storage::StorageLayout;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use chrono::Local;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{DebugSecret, ExposeSecret, Secret};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

/// Key size in bytes (AES-256)
pub const KEY_LEN: usize = 32;
/// AES-GCM nonce size (96 bits)
pub const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag size
pub const TAG_LEN: usize = 16;

/// Raw key bytes, zeroed when dropped
#[derive(Clone, Zeroize)]
pub struct KeyBytes([u8; KEY_LEN]);

impl DebugSecret for KeyBytes {}

/// Key material held by a [`Cipher`]
pub type KeyMaterial = Secret<KeyBytes>;

/// Generate a fresh key from the OS random source
pub fn generate_key() -> KeyMaterial {
    let mut bytes = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    Secret::new(KeyBytes(bytes))
}

/// Decode the transportable text form of a key
pub fn decode_key(text: &str) -> Result<KeyMaterial> {
    let mut decoded = URL_SAFE
        .decode(text.trim())
        .map_err(|e| VigilError::Configuration(format!("Encryption key is not valid base64: {e}")))?;

    if decoded.len() != KEY_LEN {
        let len = decoded.len();
        decoded.zeroize();
        return Err(VigilError::Configuration(format!(
            "Encryption key must be {KEY_LEN} bytes, got {len}"
        )));
    }

    let mut bytes = [0u8; KEY_LEN];
    bytes.copy_from_slice(&decoded);
    decoded.zeroize();
    Ok(Secret::new(KeyBytes(bytes)))
}

/// Encode a key into its transportable text form
fn encode_key(key: &KeyMaterial) -> SecretString {
    secret_string(URL_SAFE.encode(&key.expose_secret().0))
}

/// The process's single active cipher
///
/// Construct it once, wrap it in an `Arc` and hand it to whoever needs to
/// encrypt or decrypt.
pub struct Cipher {
    aead: Aes256Gcm,
    key: KeyMaterial,
    key_path: Option<PathBuf>,
    /// Older keys tried by `decrypt` after the primary one
    fallback: Vec<Aes256Gcm>,
}

impl Cipher {
    /// Initialize the cipher and persist its key
    ///
    /// Uses `existing_key` (text form) when given, otherwise generates a new
    /// key. Ensures the storage layout exists, then writes the key to a new
    /// file in the key store stamped with the current local time.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if `existing_key` is malformed and `Storage` if
    /// the layout or key file cannot be written.
    pub fn initialize(layout: &StorageLayout, existing_key: Option<&SecretString>) -> Result<Self> {
        let key = match existing_key {
            Some(text) => decode_key(text.expose_secret().as_str())?,
            None => generate_key(),
        };

        layout.ensure()?;
        let key_store = KeyStore::new(layout.keys_dir());
        let key_path = key_store.persist(&encode_key(&key), Local::now())?;

        tracing::info!(
            supplied = existing_key.is_some(),
            key_path = %key_path.display(),
            "Cipher initialized"
        );

        let mut cipher = Self::from_key(key);
        cipher.key_path = Some(key_path);
        Ok(cipher)
    }

    /// Build a cipher around key material that is already persisted
    ///
    /// Nothing is written to disk. Intended for reading partitions produced by
    /// an earlier process.
    pub fn from_key(key: KeyMaterial) -> Self {
        let aead = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.expose_secret().0));
        Self {
            aead,
            key,
            key_path: None,
            fallback: Vec::new(),
        }
    }

    /// Also accept ciphertexts sealed under `keys` when decrypting
    ///
    /// Encryption always uses the primary key. Keys are tried in the order
    /// given, after the primary.
    pub fn with_fallback_keys(mut self, keys: impl IntoIterator<Item = KeyMaterial>) -> Self {
        self.fallback.extend(
            keys.into_iter()
                .map(|key| Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.expose_secret().0))),
        );
        self
    }

    /// Number of keys `decrypt` can use, the primary included
    pub fn decryption_key_count(&self) -> usize {
        1 + self.fallback.len()
    }

    /// Build a non-persisting cipher from a key file
    pub fn from_key_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = KeyStore::load(path)?;
        Ok(Self::from_key(decode_key(text.expose_secret().as_str())?))
    }

    /// Encrypt a payload; the output embeds its nonce
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .aead
            .encrypt(nonce, plaintext)
            .map_err(|e| VigilError::Encryption(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt a payload produced by [`Cipher::encrypt`]
    ///
    /// # Errors
    ///
    /// Returns `Decryption` when the input is truncated, altered, or was
    /// encrypted under a different key.
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(VigilError::Decryption(format!(
                "ciphertext too short ({} bytes)",
                sealed.len()
            )));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        std::iter::once(&self.aead)
            .chain(&self.fallback)
            .find_map(|aead| aead.decrypt(nonce, ciphertext).ok())
            .ok_or_else(|| VigilError::Decryption("authentication failed".to_string()))
    }

    /// Encrypt text into the base64 form stored in entry fields
    pub fn encrypt_text(&self, plaintext: &str) -> Result<String> {
        Ok(URL_SAFE.encode(self.encrypt(plaintext.as_bytes())?))
    }

    /// Reverse of [`Cipher::encrypt_text`]
    pub fn decrypt_text(&self, token: &str) -> Result<String> {
        let sealed = URL_SAFE
            .decode(token.trim())
            .map_err(|e| VigilError::Decryption(format!("ciphertext is not valid base64: {e}")))?;
        let plaintext = self.decrypt(&sealed)?;
        String::from_utf8(plaintext)
            .map_err(|e| VigilError::Decryption(format!("plaintext is not UTF-8: {e}")))
    }

    /// The key in transportable text form, for operational recovery
    pub fn export_key(&self) -> SecretString {
        encode_key(&self.key)
    }

    /// Where [`Cipher::initialize`] persisted the key
    pub fn key_path(&self) -> Option<&Path> {
        self.key_path.as_deref()
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("key", &self.key)
            .field("key_path", &self.key_path)
            .field("fallback_keys", &self.fallback.len())
            .finish_non_exhaustive()
    }
}
