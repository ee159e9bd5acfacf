//! Durable snapshot of actions that have not reached a terminal state.

use std::sync::Arc;

use super::collection::{Collection, PersistenceError};
use super::kv::KeyValueStore;
use crate::models::QueuedAction;

/// Key the pending snapshot is persisted under.
pub const PENDING_KEY: &str = "pendingActions";

/// Keeps queued work across restarts. The engine rewrites the snapshot
/// whenever the in-flight set changes.
#[derive(Clone)]
pub struct PendingStore {
    collection: Collection,
}

impl PendingStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            collection: Collection::new(kv, PENDING_KEY),
        }
    }

    pub fn persist(&self, actions: &[QueuedAction]) -> Result<(), PersistenceError> {
        self.collection.write(actions)
    }

    /// Loads the snapshot, dropping anything that is already terminal and
    /// resetting interrupted attempts to `pending`.
    pub fn load(&self) -> Vec<QueuedAction> {
        self.collection
            .read_or_empty::<QueuedAction>()
            .into_iter()
            .filter(|a| !a.status.is_terminal())
            .map(QueuedAction::into_restored)
            .collect()
    }
}
