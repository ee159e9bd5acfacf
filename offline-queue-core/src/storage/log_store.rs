//! Durable store for the sync log.

use std::sync::Arc;

use super::collection::{Collection, PersistenceError};
use super::kv::KeyValueStore;
use crate::models::LogEntry;

/// Key the sync log is persisted under.
pub const LOG_KEY: &str = "syncLog";

/// Persists the complete sync log as one JSON array under [`LOG_KEY`].
///
/// Every write replaces the whole collection; callers are responsible for
/// serializing read-modify-write cycles (see [`crate::SyncLog`]).
#[derive(Clone)]
pub struct LogStore {
    collection: Collection,
}

impl LogStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            collection: Collection::new(kv, LOG_KEY),
        }
    }

    /// Writes `entries` as a single atomic value, in the given order.
    pub fn persist(&self, entries: &[LogEntry]) -> Result<(), PersistenceError> {
        self.collection.write(entries)
    }

    /// Loads the log, surfacing read and parse errors.
    pub fn try_load(&self) -> Result<Vec<LogEntry>, PersistenceError> {
        self.collection.read()
    }

    /// Loads the log. Returns an empty log if nothing was persisted or the
    /// stored data cannot be read.
    pub fn load(&self) -> Vec<LogEntry> {
        self.collection.read_or_empty()
    }
}
