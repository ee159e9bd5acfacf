//! offline-queue core library
//!
//! Durable action queue for intermittently connected clients: actions are
//! recorded immediately, delivered when the network allows, retried with
//! bounded exponential backoff, and logged durably once they succeed.

pub mod dispatch;
pub mod models;
pub mod reachability;
pub mod storage;
pub mod sync_log;
pub mod transport;

pub use dispatch::{
    ActionHandle, ActionOutcome, CategoryTimeouts, DispatchEngine, DispatchError, EngineBuilder,
    EngineConfig, PendingCounts, RetryPolicy,
};
pub use models::{ActionCategory, ActionStatus, InvalidTransition, LogEntry, QueuedAction};
pub use reachability::Reachability;
pub use storage::{
    FileStore, KeyValueStore, LogStore, MemoryStore, PendingStore, PersistenceError, StorageError,
};
pub use sync_log::{LogSnapshot, SyncLog};
pub use transport::{Transport, TransportError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
