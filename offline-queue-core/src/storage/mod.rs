//! Durable storage for the sync log and queued work.
//!
//! Everything is stored through the [`KeyValueStore`] trait; each logical
//! collection is one JSON array under one fixed key:
//! - `syncLog`: completed actions, newest first
//! - `pendingActions`: actions not yet terminal
//! - `<key>.corrupt`, `<key>.corrupt.1`, ...: unparseable values seen under `<key>`

mod collection;
mod file_store;
mod kv;
mod log_store;
mod pending_store;

pub use collection::{PersistenceError, CORRUPT_SUFFIX};
pub use file_store::FileStore;
pub use kv::{KeyValueStore, MemoryStore, StorageError};
pub use log_store::{LogStore, LOG_KEY};
pub use pending_store::{PendingStore, PENDING_KEY};
