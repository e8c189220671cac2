//! Storage backend selection and configuration.

use crate::error::{Result, StoreError};
use crate::journal::{JournalConfig, JournalStorage};
use crate::storage::Storage;
use crate::store::InMemoryStorage;
use crate::subscriptions::NotifierConfig;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Environment variable selecting the backend (`in_memory` or `journal`).
pub const ENV_STORAGE: &str = "POST_COMMENTS_STORAGE";
/// Environment variable with the journal directory.
pub const ENV_JOURNAL_PATH: &str = "POST_COMMENTS_JOURNAL_PATH";
/// Environment variable with the journal fsync interval.
pub const ENV_JOURNAL_SYNC_INTERVAL: &str = "POST_COMMENTS_JOURNAL_SYNC_INTERVAL";
/// Environment variable with the per-subscriber buffer size.
pub const ENV_SUBSCRIBER_BUFFER: &str = "POST_COMMENTS_SUBSCRIBER_BUFFER";

/// Which storage backend to run on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorageBackend {
    /// Volatile, with live subscriptions.
    #[default]
    InMemory,
    /// Durable journal, no live subscriptions.
    Journal,
}

impl FromStr for StorageBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "memory" => Ok(StorageBackend::InMemory),
            "journal" => Ok(StorageBackend::Journal),
            other => Err(StoreError::InvalidConfig(format!(
                "unknown storage backend: {:?} (expected \"in_memory\" or \"journal\")",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::InMemory => write!(f, "in_memory"),
            StorageBackend::Journal => write!(f, "journal"),
        }
    }
}

/// Full storage configuration.
#[derive(Clone, Debug, Default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Used when `backend` is `Journal`.
    pub journal: JournalConfig,

    /// Used when `backend` is `InMemory`.
    pub notifier: NotifierConfig,
}

impl StorageConfig {
    /// Read the configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from a key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(backend) = lookup(ENV_STORAGE) {
            config.backend = backend.parse()?;
        }
        if let Some(path) = lookup(ENV_JOURNAL_PATH) {
            config.journal.path = PathBuf::from(path);
        }
        if let Some(interval) = lookup(ENV_JOURNAL_SYNC_INTERVAL) {
            config.journal.sync_interval = parse_number(ENV_JOURNAL_SYNC_INTERVAL, &interval)?;
        }
        if let Some(size) = lookup(ENV_SUBSCRIBER_BUFFER) {
            let size: usize = parse_number(ENV_SUBSCRIBER_BUFFER, &size)?;
            if size == 0 {
                return Err(StoreError::InvalidConfig(format!(
                    "{} must be at least 1",
                    ENV_SUBSCRIBER_BUFFER
                )));
            }
            config.notifier.buffer_size = size;
        }

        Ok(config)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| StoreError::InvalidConfig(format!("{} is not a number: {:?}", key, value)))
}

/// Open the configured backend.
pub fn open_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    match config.backend {
        StorageBackend::InMemory => Ok(Arc::new(InMemoryStorage::with_notifier_config(
            config.notifier.clone(),
        ))),
        StorageBackend::Journal => Ok(Arc::new(JournalStorage::open_or_create(
            config.journal.clone(),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewPost;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorageConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.backend, StorageBackend::InMemory);
        assert_eq!(config.notifier.buffer_size, crate::subscriptions::DEFAULT_BUFFER_SIZE);
        assert_eq!(config.journal.sync_interval, 1);
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!("in_memory".parse::<StorageBackend>().unwrap(), StorageBackend::InMemory);
        assert_eq!("Journal".parse::<StorageBackend>().unwrap(), StorageBackend::Journal);
        assert!(matches!(
            "postgres".parse::<StorageBackend>(),
            Err(StoreError::InvalidConfig(_))
        ));
        assert_eq!(StorageBackend::Journal.to_string(), "journal");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = StorageConfig::from_lookup(lookup_from(&[
            (ENV_STORAGE, "journal"),
            (ENV_JOURNAL_PATH, "/var/lib/posts"),
            (ENV_JOURNAL_SYNC_INTERVAL, "50"),
            (ENV_SUBSCRIBER_BUFFER, "8"),
        ]))
        .unwrap();

        assert_eq!(config.backend, StorageBackend::Journal);
        assert_eq!(config.journal.path, PathBuf::from("/var/lib/posts"));
        assert_eq!(config.journal.sync_interval, 50);
        assert_eq!(config.notifier.buffer_size, 8);
    }

    #[test]
    fn test_invalid_numbers() {
        let result = StorageConfig::from_lookup(lookup_from(&[(ENV_SUBSCRIBER_BUFFER, "lots")]));
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));

        let result = StorageConfig::from_lookup(lookup_from(&[(ENV_SUBSCRIBER_BUFFER, "0")]));
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_open_storage_backends() {
        let storage = open_storage(&StorageConfig::default()).unwrap();
        assert!(storage.subscriptions().is_some());

        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Journal,
            journal: JournalConfig {
                path: dir.path().join("journal"),
                ..Default::default()
            },
            ..Default::default()
        };
        let storage = open_storage(&config).unwrap();
        assert!(storage.subscriptions().is_none());
        storage.create_post(NewPost::new("T", "B")).unwrap();
    }
}
