//! A JSON array persisted whole under a single key.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::kv::{KeyValueStore, StorageError};

/// Suffix of the keys corrupt blobs are copied to before they are discarded.
pub const CORRUPT_SUFFIX: &str = ".corrupt";

/// Errors persisting or loading a collection.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backend write failed; the collection on disk is unchanged.
    #[error("Failed to persist '{key}': {source}")]
    Write { key: String, source: StorageError },
    /// The backend read failed.
    #[error("Failed to read '{key}': {source}")]
    Read { key: String, source: StorageError },
    /// The stored value is not a valid JSON array of the expected records.
    #[error("Corrupt data under '{key}': {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
    #[error("Failed to serialize '{key}': {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
}

/// Typed handle to one JSON array under one key.
#[derive(Clone)]
pub(crate) struct Collection {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl Collection {
    pub(crate) fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// Serializes the full collection and writes it in one `set`.
    pub(crate) fn write<T: Serialize>(&self, items: &[T]) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(items).map_err(|source| PersistenceError::Serialize {
            key: self.key.clone(),
            source,
        })?;

        self.kv
            .set(&self.key, &json)
            .map_err(|source| PersistenceError::Write {
                key: self.key.clone(),
                source,
            })
    }

    /// Reads the collection. An absent or blank value is an empty collection.
    pub(crate) fn read<T: DeserializeOwned>(&self) -> Result<Vec<T>, PersistenceError> {
        let raw = self
            .kv
            .get(&self.key)
            .map_err(|source| PersistenceError::Read {
                key: self.key.clone(),
                source,
            })?;

        match raw {
            Some(raw) if !raw.trim().is_empty() => {
                serde_json::from_str(&raw).map_err(|source| PersistenceError::Corrupt {
                    key: self.key.clone(),
                    source,
                })
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Reads the collection, substituting an empty one on any failure.
    ///
    /// Corrupt data is copied to an unused `<key>.corrupt*` slot before
    /// being ignored, so the next successful write does not destroy it.
    pub(crate) fn read_or_empty<T: DeserializeOwned>(&self) -> Vec<T> {
        match self.read() {
            Ok(items) => items,
            Err(PersistenceError::Corrupt { source, .. }) => {
                tracing::warn!(
                    "Discarding corrupt data under '{}': {}",
                    self.key,
                    source
                );
                self.quarantine();
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("{}", e);
                Vec::new()
            }
        }
    }

    /// Copies the raw value to the first free archive slot: `<key>.corrupt`,
    /// then `<key>.corrupt.1`, `<key>.corrupt.2`, and so on.
    fn quarantine(&self) {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            _ => return,
        };
        let archive_key = match self.free_archive_key(&raw) {
            Ok(Some(key)) => key,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Failed to archive corrupt data: {}", e);
                return;
            }
        };
        match self.kv.set(&archive_key, &raw) {
            Ok(()) => tracing::info!("Archived corrupt data to '{}'", archive_key),
            Err(e) => tracing::warn!("Failed to archive corrupt data: {}", e),
        }
    }

    /// Returns `None` if `raw` is already archived.
    fn free_archive_key(&self, raw: &str) -> Result<Option<String>, StorageError> {
        let base = format!("{}{}", self.key, CORRUPT_SUFFIX);
        let mut candidate = base.clone();
        let mut n = 0u32;
        while let Some(archived) = self.kv.get(&candidate)? {
            if archived == raw {
                return Ok(None);
            }
            n += 1;
            candidate = format!("{}.{}", base, n);
        }
        Ok(Some(candidate))
    }
}
