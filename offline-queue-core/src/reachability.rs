//! Network reachability signal.

use std::sync::Arc;

use tokio::sync::watch;

/// Live online/offline flag shared between whatever observes the network
/// and the dispatch engine.
///
/// Cloning yields another handle to the same signal.
#[derive(Debug, Clone)]
pub struct Reachability {
    tx: Arc<watch::Sender<bool>>,
}

impl Reachability {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// Updates the flag. Subscribers are only woken on an actual change.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!("Network is {}", if online { "online" } else { "offline" });
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Resolves as soon as the flag is (or becomes) true.
    pub async fn wait_online(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a close.
        let _ = rx.wait_for(|online| *online).await;
    }
}

impl Default for Reachability {
    fn default() -> Self {
        Self::new(false)
    }
}
