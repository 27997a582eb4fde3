//! Audit pipeline
//!
//! Turns one application event into one persisted [`LogEntry`]: identifying
//! fields are anonymized, payloads are encrypted, and the entry is appended to
//! both streams of today's partition.

use super::retention::{PurgeReport, RetentionManager};
use crate::anonymization::{Anonymizer, HashTokenizer};
use crate::config::{SecretString, VigilConfig};
use crate::crypto::{decode_key, Cipher, KeyMaterial, KeyStore};
use crate::domain::{
    AnonymizedUser, EntryMetadata, EventId, LogEntry, PartitionDate, Result, UserAttributes,
    VigilError,
};
use crate::storage::{LogStore, StorageLayout};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Tag used for `client` and `source` when the caller leaves them out
pub const UNKNOWN_TAG: &str = "unknown";

/// Plaintext payloads of an entry, recovered by [`AuditPipeline::reveal`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevealedPayload {
    /// Free-text payload, `None` when the entry carried none
    pub content: Option<String>,
    /// Structured payload, `None` when the entry carried none
    pub additional_data: Option<Map<String, Value>>,
}

/// Records audit events
///
/// One pipeline owns one [`LogStore`] and shares the process [`Cipher`] with
/// it. The pipeline is `Send + Sync`; concurrent `log_event` calls are
/// serialized inside the store.
pub struct AuditPipeline {
    store: LogStore,
    cipher: Arc<Cipher>,
    anonymizer: Box<dyn Anonymizer>,
    retention: RetentionManager,
    platform: String,
}

impl AuditPipeline {
    /// Create a pipeline writing under `layout` with `cipher`
    ///
    /// The key file of `cipher`, if any, is protected from retention.
    pub fn new(layout: StorageLayout, cipher: Arc<Cipher>, platform: impl Into<String>) -> Self {
        let mut retention = RetentionManager::new(layout.clone());
        if let Some(path) = cipher.key_path() {
            retention = retention.protect(path);
        }

        Self {
            store: LogStore::new(layout, Arc::clone(&cipher)),
            cipher,
            anonymizer: Box::new(HashTokenizer::new()),
            retention,
            platform: platform.into(),
        }
    }

    /// Wire a pipeline from configuration
    ///
    /// The key comes from `[encryption] key`, else from `[encryption] key_file`,
    /// else a fresh key is generated. In every case the key is persisted to the
    /// key store.
    pub fn from_config(config: &VigilConfig) -> Result<Self> {
        let layout = StorageLayout::new(&config.storage.root);
        let key = resolve_configured_key(config)?;
        let cipher = Arc::new(Cipher::initialize(&layout, key.as_ref())?);

        info!(
            root = %layout.root().display(),
            platform = %config.metadata.platform,
            key_file = ?cipher.key_path(),
            "Audit pipeline initialized"
        );
        Ok(Self::new(layout, cipher, config.metadata.platform.clone()))
    }

    /// Open the storage of `config` for reading with an existing cipher
    ///
    /// Unlike [`from_config`](Self::from_config) nothing is written to the
    /// key store.
    pub fn for_reading(config: &VigilConfig, cipher: Cipher) -> Self {
        Self::new(
            StorageLayout::new(&config.storage.root),
            Arc::new(cipher),
            config.metadata.platform.clone(),
        )
    }

    /// Replace the anonymization strategy
    pub fn with_anonymizer(mut self, anonymizer: impl Anonymizer + 'static) -> Self {
        self.anonymizer = Box::new(anonymizer);
        self
    }

    /// The underlying store
    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// The process cipher
    pub fn cipher(&self) -> &Arc<Cipher> {
        &self.cipher
    }

    /// Record one event
    ///
    /// # Workflow
    ///
    /// 1. Anonymize the user identifier, username, first and last name
    /// 2. Derive a fresh event ID from a random UUID and the anonymized id
    /// 3. Encrypt `content` and the JSON of `additional_data` when non-empty
    /// 4. Append the entry to today's partition
    ///
    /// # Errors
    ///
    /// Any failure means nothing was appended and the event is not recorded.
    pub fn log_event(
        &self,
        event_type: &str,
        user: &UserAttributes,
        content: &str,
        additional_data: Option<&Map<String, Value>>,
    ) -> Result<EventId> {
        let entry = self.build_entry(event_type, user, content, additional_data)?;
        let partition = self.store.append(&entry)?;
        crate::log_event_recorded!(&entry.event_id, event_type, partition);
        Ok(entry.event_id)
    }

    fn build_entry(
        &self,
        event_type: &str,
        user: &UserAttributes,
        content: &str,
        additional_data: Option<&Map<String, Value>>,
    ) -> Result<LogEntry> {
        let anonymize = |value: Option<&str>| self.anonymizer.anonymize(value.unwrap_or_default());

        let id_anon = self.anonymizer.anonymize(&user.id_text());
        let anonymized = AnonymizedUser {
            username_anon: anonymize(user.username.as_deref()),
            first_name_anon: anonymize(user.first_name.as_deref()),
            last_name_anon: anonymize(user.last_name.as_deref()),
            language_code: user.language_code.clone().unwrap_or_default(),
            is_bot: user.is_bot,
            id_anon,
        };

        let metadata = EntryMetadata {
            platform: self.platform.clone(),
            client: user.client.clone().unwrap_or_else(|| UNKNOWN_TAG.to_string()),
            source: user.source.clone().unwrap_or_else(|| UNKNOWN_TAG.to_string()),
        };

        let mut seed = Uuid::new_v4().as_bytes().to_vec();
        seed.extend_from_slice(anonymized.id_anon.as_bytes());
        let event_id = EventId::derive(&seed);

        let content = if content.is_empty() {
            String::new()
        } else {
            self.cipher.encrypt_text(content)?
        };

        let additional_data = match additional_data {
            Some(data) if !data.is_empty() => {
                self.cipher.encrypt_text(&serde_json::to_string(data)?)?
            }
            _ => String::new(),
        };

        Ok(LogEntry {
            timestamp: Utc::now(),
            event_id,
            event_type: event_type.to_string(),
            user: anonymized,
            metadata,
            content,
            additional_data,
        })
    }

    /// Read a partition by `YYYY-MM-DD` date as JSON values
    ///
    /// With `decrypt` false the redacted stream is returned; with `decrypt`
    /// true the encrypted stream is decrypted into full entries whose payload
    /// fields are still ciphertext text (see [`reveal`](Self::reveal)).
    ///
    /// # Errors
    ///
    /// Returns `InvalidDate` for a malformed date. A date with no data yields
    /// an empty list.
    pub fn read_logs(&self, date: &str, decrypt: bool) -> Result<Vec<Value>> {
        let date = PartitionDate::parse(date)?;
        self.store.read(date, decrypt)
    }

    /// Read and decrypt the full entries of a partition
    pub fn read_entries(&self, date: &str) -> Result<Vec<LogEntry>> {
        let date = PartitionDate::parse(date)?;
        self.store.read_decrypted(date)
    }

    /// Decrypt the payload fields of a retrieved entry
    pub fn reveal(&self, entry: &LogEntry) -> Result<RevealedPayload> {
        let content = if entry.has_content() {
            Some(self.cipher.decrypt_text(&entry.content)?)
        } else {
            None
        };

        let additional_data = if entry.has_additional_data() {
            let json = self.cipher.decrypt_text(&entry.additional_data)?;
            Some(serde_json::from_str(&json)?)
        } else {
            None
        };

        Ok(RevealedPayload {
            content,
            additional_data,
        })
    }

    /// Text form of the process key
    pub fn export_key(&self) -> SecretString {
        self.cipher.export_key()
    }

    /// Delete partitions and key files older than `older_than_days` days
    ///
    /// The key file of this pipeline's cipher is never deleted. Do not purge
    /// while events are being logged.
    pub fn purge(&self, older_than_days: u32) -> Result<PurgeReport> {
        self.retention.purge(older_than_days)
    }
}

impl std::fmt::Debug for AuditPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditPipeline")
            .field("store", &self.store)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

fn resolve_configured_key(config: &VigilConfig) -> Result<Option<SecretString>> {
    match (&config.encryption.key, &config.encryption.key_file) {
        (Some(_), Some(_)) => Err(VigilError::Configuration(
            "encryption.key and encryption.key_file are mutually exclusive".to_string(),
        )),
        (Some(key), None) => Ok(Some(key.clone())),
        (None, Some(path)) => KeyStore::load(path).map(Some),
        (None, None) => Ok(None),
    }
}

/// Build the cipher to read existing partitions with
///
/// A `key_file` argument, `[encryption] key` or `[encryption] key_file` is
/// used alone. Otherwise every file in the key store is loaded, newest as the
/// primary key and the rest as fallbacks, since each process that generated
/// its own key wrote its records under it. `None` when no key is available.
pub fn resolve_read_cipher(config: &VigilConfig, key_file: Option<&Path>) -> Result<Option<Cipher>> {
    let explicit = match key_file {
        Some(path) => Some(KeyStore::load(path)?),
        None => resolve_configured_key(config)?,
    };
    if let Some(text) = explicit {
        return decode_key(text.expose_secret().as_str())
            .map(Cipher::from_key)
            .map(Some);
    }

    let store = KeyStore::new(StorageLayout::new(&config.storage.root).keys_dir());
    let mut files = store.list()?;
    let Some(newest) = files.pop() else {
        return Ok(None);
    };
    let primary = decode_key(KeyStore::load(&newest.path)?.expose_secret().as_str())?;

    let mut fallback: Vec<KeyMaterial> = Vec::with_capacity(files.len());
    for file in files.iter().rev() {
        match KeyStore::load(&file.path).and_then(|text| decode_key(text.expose_secret().as_str())) {
            Ok(key) => fallback.push(key),
            Err(e) => warn!(path = %file.path.display(), error = %e, "Skipping unusable key file"),
        }
    }

    let cipher = Cipher::from_key(primary).with_fallback_keys(fallback);
    info!(
        key_file = %newest.path.display(),
        keys = cipher.decryption_key_count(),
        "Loaded stored keys for reading"
    );
    Ok(Some(cipher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::{anonymize, ANONYMOUS_TOKEN};
    use crate::crypto::generate_key;
    use serde_json::json;
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir) -> AuditPipeline {
        let cipher = Arc::new(Cipher::from_key(generate_key()));
        AuditPipeline::new(StorageLayout::new(dir.path()), cipher, "telegram")
    }

    fn alice() -> UserAttributes {
        UserAttributes {
            username: Some("alice".to_string()),
            first_name: Some("A".to_string()),
            last_name: Some("B".to_string()),
            language_code: Some("en".to_string()),
            ..UserAttributes::with_id(123)
        }
    }

    fn today() -> String {
        PartitionDate::today().to_string()
    }

    #[test]
    fn test_message_event_round_trip() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);

        let event_id = pipeline.log_event("message", &alice(), "hello", None).unwrap();
        assert_eq!(event_id.as_str().len(), 12);

        let redacted = pipeline.read_logs(&today(), false).unwrap();
        assert_eq!(redacted.len(), 1);
        let line = &redacted[0];
        assert_eq!(line["event_type"], "message");
        assert_eq!(line["event_id"], event_id.as_str());
        assert!(line.get("content").is_none());
        assert!(line.get("additional_data").is_none());
        for field in ["id_anon", "username_anon", "first_name_anon", "last_name_anon"] {
            let token = line["user"][field].as_str().unwrap();
            assert_eq!(token.len(), 12);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_eq!(line["user"]["id_anon"], anonymize("123"));
        assert_eq!(line["user"]["language_code"], "en");

        let entries = pipeline.read_entries(&today()).unwrap();
        assert_eq!(entries.len(), 1);
        let revealed = pipeline.reveal(&entries[0]).unwrap();
        assert_eq!(revealed.content.as_deref(), Some("hello"));
        assert_eq!(revealed.additional_data, None);
    }

    #[test]
    fn test_metadata_defaults() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        pipeline
            .log_event("join", &UserAttributes::default(), "", None)
            .unwrap();

        let entry = &pipeline.read_entries(&today()).unwrap()[0];
        assert_eq!(entry.metadata.platform, "telegram");
        assert_eq!(entry.metadata.client, UNKNOWN_TAG);
        assert_eq!(entry.metadata.source, UNKNOWN_TAG);
        assert_eq!(entry.user.id_anon, ANONYMOUS_TOKEN);
        assert_eq!(entry.user.language_code, "");
        assert!(entry.content.is_empty());
        assert!(entry.additional_data.is_empty());
    }

    #[test]
    fn test_additional_data_is_encrypted() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let data = json!({"chat_id": 42, "reply": true});
        let data = data.as_object().unwrap();

        pipeline
            .log_event("command", &alice(), "/start", Some(data))
            .unwrap();

        let entry = &pipeline.read_entries(&today()).unwrap()[0];
        assert!(!entry.additional_data.contains("chat_id"));
        let revealed = pipeline.reveal(entry).unwrap();
        assert_eq!(revealed.additional_data.as_ref(), Some(data));
    }

    #[test]
    fn test_empty_additional_data_is_omitted() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        pipeline
            .log_event("command", &alice(), "", Some(&Map::new()))
            .unwrap();

        let entry = &pipeline.read_entries(&today()).unwrap()[0];
        assert_eq!(entry.additional_data, "");
    }

    #[test]
    fn test_event_ids_differ_for_same_user() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let first = pipeline.log_event("message", &alice(), "a", None).unwrap();
        let second = pipeline.log_event("message", &alice(), "a", None).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_read_logs_rejects_bad_date() {
        let dir = TempDir::new().unwrap();
        let result = pipeline(&dir).read_logs("yesterday", false);
        assert!(matches!(result, Err(VigilError::InvalidDate(_))));
    }

    #[test]
    fn test_read_logs_empty_date() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        assert!(pipeline.read_logs("2001-01-01", false).unwrap().is_empty());
        assert!(pipeline.read_logs("2001-01-01", true).unwrap().is_empty());
    }

    #[test]
    fn test_export_key_decodes_to_same_cipher() {
        use secrecy::ExposeSecret;

        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        pipeline.log_event("message", &alice(), "hello", None).unwrap();

        let key = crate::crypto::decode_key(pipeline.export_key().expose_secret().as_str()).unwrap();
        let reader = AuditPipeline::new(
            StorageLayout::new(dir.path()),
            Arc::new(Cipher::from_key(key)),
            "telegram",
        );
        let entry = &reader.read_entries(&today()).unwrap()[0];
        assert_eq!(reader.reveal(entry).unwrap().content.as_deref(), Some("hello"));
    }

    #[test]
    fn test_from_config_rejects_both_key_sources() {
        let dir = TempDir::new().unwrap();
        let mut config = VigilConfig::default();
        config.storage.root = dir.path().display().to_string();
        config.encryption.key = Some(crate::config::secret_string("x".to_string()));
        config.encryption.key_file = Some("key.key".to_string());

        let result = AuditPipeline::from_config(&config);
        assert!(matches!(result, Err(VigilError::Configuration(_))));
    }

    #[test]
    fn test_read_cipher_covers_every_stored_key() {
        let dir = TempDir::new().unwrap();
        let mut config = VigilConfig::default();
        config.storage.root = dir.path().display().to_string();
        assert!(resolve_read_cipher(&config, None).unwrap().is_none());

        // two runs, each with its own generated key
        for content in ["first run", "second run"] {
            let writer = AuditPipeline::from_config(&config).unwrap();
            writer.log_event("message", &alice(), content, None).unwrap();
        }
        let key_files = KeyStore::new(dir.path().join("keys")).list().unwrap();
        assert_eq!(key_files.len(), 2);

        let cipher = resolve_read_cipher(&config, None).unwrap().unwrap();
        assert_eq!(cipher.decryption_key_count(), 2);
        let reader = AuditPipeline::for_reading(&config, cipher);
        let revealed: Vec<_> = reader
            .read_entries(&today())
            .unwrap()
            .iter()
            .map(|entry| reader.reveal(entry).unwrap().content.unwrap())
            .collect();
        assert_eq!(revealed, vec!["first run", "second run"]);

        // reading never adds key files
        assert_eq!(KeyStore::new(dir.path().join("keys")).list().unwrap().len(), 2);
    }

    #[test]
    fn test_read_cipher_explicit_key_file_is_used_alone() {
        let dir = TempDir::new().unwrap();
        let mut config = VigilConfig::default();
        config.storage.root = dir.path().display().to_string();
        let first = AuditPipeline::from_config(&config).unwrap();
        let first_key = first.cipher().key_path().unwrap().to_path_buf();
        AuditPipeline::from_config(&config).unwrap();

        let cipher = resolve_read_cipher(&config, Some(first_key.as_path())).unwrap().unwrap();
        assert_eq!(cipher.decryption_key_count(), 1);
        let token = first.cipher().encrypt_text("pinned").unwrap();
        assert_eq!(cipher.decrypt_text(&token).unwrap(), "pinned");
    }

    #[test]
    fn test_custom_anonymizer_replaces_tokens() {
        struct Constant;
        impl Anonymizer for Constant {
            fn anonymize(&self, raw: &str) -> String {
                if raw.is_empty() {
                    ANONYMOUS_TOKEN.to_string()
                } else {
                    "masked".to_string()
                }
            }
        }

        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir).with_anonymizer(Constant);
        pipeline.log_event("message", &alice(), "hi", None).unwrap();

        let entry = &pipeline.read_entries(&today()).unwrap()[0];
        assert_eq!(entry.user.id_anon, "masked");
        assert_eq!(entry.user.username_anon, "masked");
        assert_eq!(entry.user.first_name_anon, "masked");
        assert_eq!(entry.user.last_name_anon, "masked");
        // event ids are still hex digests
        assert!(entry.event_id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_from_config_persists_generated_key() {
        let dir = TempDir::new().unwrap();
        let mut config = VigilConfig::default();
        config.storage.root = dir.path().display().to_string();

        let pipeline = AuditPipeline::from_config(&config).unwrap();
        let key_path = pipeline.cipher().key_path().unwrap().to_path_buf();
        assert!(key_path.starts_with(dir.path().join("keys")));

        // the active key file outlives even a zero-day purge
        pipeline.purge(0).unwrap();
        assert!(key_path.exists());
    }
}
