//! In-memory view of the sync log, backed by [`LogStore`].

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::models::LogEntry;
use crate::storage::{LogStore, PersistenceError};

/// Shared snapshot of the log, newest entry first.
pub type LogSnapshot = Arc<Vec<LogEntry>>;

/// The sync log as seen by the application.
///
/// Holds a most-recent-first cache of the durable log and is the only
/// writer of it. Appends are read-modify-write over the whole collection,
/// so they are serialized: a second append always sees the first.
pub struct SyncLog {
    store: LogStore,
    writer: Mutex<()>,
    entries: watch::Sender<LogSnapshot>,
}

impl SyncLog {
    /// Creates an empty view. Call [`SyncLog::rehydrate`] to pick up
    /// previously persisted entries.
    pub fn new(store: LogStore) -> Self {
        let (entries, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            store,
            writer: Mutex::new(()),
            entries,
        }
    }

    /// Replaces the cache wholesale with what is persisted. Returns the
    /// number of entries loaded.
    pub fn rehydrate(&self) -> usize {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let loaded = self.store.load();
        let count = loaded.len();
        self.entries.send_replace(Arc::new(loaded));
        tracing::debug!("Rehydrated {} sync log entr(ies)", count);
        count
    }

    /// Prepends `entry` and persists the whole log.
    ///
    /// The cache is updated even when the write fails; the error reports a
    /// durability gap, not a lost completion.
    pub fn append(&self, entry: LogEntry) -> Result<(), PersistenceError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.entries.borrow().clone();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.push(entry);
        next.extend(current.iter().cloned());

        let result = self.store.persist(&next);
        self.entries.send_replace(Arc::new(next));
        result
    }

    /// Current entries, newest first.
    pub fn entries(&self) -> LogSnapshot {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver notified after every append or rehydrate.
    pub fn subscribe(&self) -> watch::Receiver<LogSnapshot> {
        self.entries.subscribe()
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }
}
