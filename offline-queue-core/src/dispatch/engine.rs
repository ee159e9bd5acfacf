//! The dispatch engine: owns the in-flight set and drives each action
//! through its lifecycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use uuid::Uuid;

use super::counts::PendingCounts;
use super::handle::{ActionHandle, ActionOutcome, DispatchError, OutcomeSender};
use super::policy::EngineConfig;
use crate::models::{ActionCategory, ActionStatus, LogEntry, QueuedAction};
use crate::reachability::Reachability;
use crate::storage::PendingStore;
use crate::sync_log::{LogSnapshot, SyncLog};
use crate::transport::{Transport, TransportError};

type InFlight = HashMap<Uuid, QueuedAction>;

/// Non-terminal actions as of one change to the in-flight set.
struct PendingSnapshot {
    generation: u64,
    actions: Vec<QueuedAction>,
}

/// What happens after a failed attempt.
enum AfterFailure {
    RetryIn(Duration),
    GiveUp(DispatchError),
}

struct Inner {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    reachability: Reachability,
    log: Arc<SyncLog>,
    pending_store: Option<PendingStore>,
    in_flight: Mutex<InFlight>,
    /// Loaded from the pending store but not yet driven by a task.
    parked: Mutex<Vec<Uuid>>,
    /// Bumped under the in-flight lock on every change worth persisting.
    generation: AtomicU64,
    /// Generation of the snapshot last written to the pending store.
    written: Mutex<u64>,
    counts: watch::Sender<PendingCounts>,
    shutdown: watch::Sender<bool>,
}

/// Accepts actions and delivers them when the network allows.
///
/// Each submitted action is driven by its own task, so attempts for one
/// action never overlap while different actions proceed concurrently. The
/// in-flight set is the single shared structure; every change to it
/// republishes [`PendingCounts`]. With a pending store configured, actions
/// left there by an earlier run are loaded at build time and counted as
/// pending until [`DispatchEngine::restore_pending`] starts them.
///
/// Cloning the engine yields another handle to the same state.
#[derive(Clone)]
pub struct DispatchEngine {
    inner: Arc<Inner>,
}

/// Builder for [`DispatchEngine`].
pub struct EngineBuilder {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    reachability: Reachability,
    log: Arc<SyncLog>,
    pending_store: Option<PendingStore>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reachability(mut self, reachability: Reachability) -> Self {
        self.reachability = reachability;
        self
    }

    /// Persist non-terminal actions so they can be restored after a restart.
    /// Whatever the store already holds is adopted by the built engine.
    pub fn pending_store(mut self, store: PendingStore) -> Self {
        self.pending_store = Some(store);
        self
    }

    pub fn build(self) -> DispatchEngine {
        let stored = self
            .pending_store
            .as_ref()
            .map(PendingStore::load)
            .unwrap_or_default();
        if !stored.is_empty() {
            tracing::info!("Found {} pending action(s) from a previous run", stored.len());
        }

        let parked: Vec<Uuid> = stored.iter().map(|a| a.id).collect();
        let in_flight: InFlight = stored.into_iter().map(|a| (a.id, a)).collect();
        let (counts, _) = watch::channel(PendingCounts::from_actions(in_flight.values()));
        let (shutdown, _) = watch::channel(false);
        DispatchEngine {
            inner: Arc::new(Inner {
                config: self.config,
                transport: self.transport,
                reachability: self.reachability,
                log: self.log,
                pending_store: self.pending_store,
                in_flight: Mutex::new(in_flight),
                parked: Mutex::new(parked),
                generation: AtomicU64::new(0),
                written: Mutex::new(0),
                counts,
                shutdown,
            }),
        }
    }
}

impl DispatchEngine {
    /// Starts building an engine. Reachability defaults to offline.
    pub fn builder(transport: Arc<dyn Transport>, log: Arc<SyncLog>) -> EngineBuilder {
        EngineBuilder {
            config: EngineConfig::default(),
            transport,
            reachability: Reachability::default(),
            log,
            pending_store: None,
        }
    }

    /// Queues a new action. It is counted as pending before this returns.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, category: ActionCategory, payload: serde_json::Value) -> ActionHandle {
        let action = QueuedAction::new(category, payload);
        tracing::debug!("Submitted {} action {}", category, action.id);
        self.track(action)
    }

    /// Starts dispatching the actions a previous run left in the pending
    /// store, oldest first. Each is returned at most once.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn restore_pending(&self) -> Vec<ActionHandle> {
        let parked = std::mem::take(&mut *lock(&self.inner.parked));
        if parked.is_empty() {
            return Vec::new();
        }

        let mut restored: Vec<(i64, Uuid, ActionHandle, OutcomeSender)> = {
            let in_flight = self.inner.lock_in_flight();
            parked
                .iter()
                .filter_map(|id| in_flight.get(id))
                .map(|action| {
                    let (handle, tx) = ActionHandle::new(action);
                    (action.created_at, action.id, handle, tx)
                })
                .collect()
        };
        restored.sort_by_key(|(created_at, id, _, _)| (*created_at, *id));

        tracing::info!("Restoring {} pending action(s)", restored.len());
        restored
            .into_iter()
            .map(|(_, id, handle, tx)| {
                tokio::spawn(drive(self.inner.clone(), id, tx));
                handle
            })
            .collect()
    }

    fn track(&self, action: QueuedAction) -> ActionHandle {
        let (handle, tx) = ActionHandle::new(&action);
        let id = action.id;
        let snapshot = {
            let mut in_flight = self.inner.lock_in_flight();
            in_flight.insert(id, action);
            self.inner.publish(&in_flight);
            self.inner.snapshot_pending(&in_flight)
        };
        self.inner.persist_pending(snapshot);
        tokio::spawn(drive(self.inner.clone(), id, tx));
        handle
    }

    /// Latest pending counts.
    pub fn pending_counts(&self) -> PendingCounts {
        self.inner.counts.borrow().clone()
    }

    /// Receiver notified whenever the pending counts change.
    pub fn subscribe_counts(&self) -> watch::Receiver<PendingCounts> {
        self.inner.counts.subscribe()
    }

    /// Snapshot of actions not yet terminal, oldest first.
    pub fn in_flight(&self) -> Vec<QueuedAction> {
        snapshot(&self.inner.lock_in_flight())
    }

    /// The sync log, newest first.
    pub fn current_log(&self) -> LogSnapshot {
        self.inner.log.entries()
    }

    pub fn subscribe_log(&self) -> watch::Receiver<LogSnapshot> {
        self.inner.log.subscribe()
    }

    /// Reloads the sync log from durable storage.
    pub fn rehydrate(&self) -> usize {
        self.inner.log.rehydrate()
    }

    pub fn reachability(&self) -> &Reachability {
        &self.inner.reachability
    }

    /// Resolves once no action is pending. Actions adopted from the pending
    /// store count until [`restore_pending`](Self::restore_pending) has run
    /// and they finish.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.counts.subscribe();
        // The sender is owned by `inner`, which outlives this borrow.
        let _ = rx.wait_for(PendingCounts::is_empty).await;
    }

    /// Stops every dispatch task. Outstanding handles resolve with
    /// [`DispatchError::Interrupted`]; pending work stays in the pending
    /// store if one is configured.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.send_replace(true) {
            tracing::info!("Dispatch engine shutting down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }
}

async fn drive(inner: Arc<Inner>, id: Uuid, tx: OutcomeSender) {
    let mut shutdown = inner.shutdown.subscribe();

    let result = tokio::select! {
        result = inner.dispatch(id) => result,
        _ = shutdown.wait_for(|stop| *stop) => {
            tracing::debug!("Action {} interrupted", id);
            Err(DispatchError::Interrupted(id))
        }
    };

    // The caller may have dropped the handle.
    let _ = tx.send(result);
}

impl Inner {
    fn lock_in_flight(&self) -> MutexGuard<'_, InFlight> {
        lock(&self.in_flight)
    }

    async fn dispatch(&self, id: Uuid) -> Result<ActionOutcome, DispatchError> {
        loop {
            if !self.reachability.is_online() {
                tracing::debug!("Action {} waiting for network", id);
                self.reachability.wait_online().await;
            }

            let action = self.begin_attempt(id)?;
            let timeout = self.config.timeouts.for_category(action.category);
            tracing::debug!(
                "Sending {} action {} (attempt {})",
                action.category,
                id,
                action.retry_count + 1
            );

            match self.transport.send(&action, timeout).await {
                Ok(()) => return self.complete(id),
                Err(error) => match self.fail_attempt(id, error)? {
                    AfterFailure::RetryIn(delay) => tokio::time::sleep(delay).await,
                    AfterFailure::GiveUp(error) => return Err(error),
                },
            }
        }
    }

    /// Marks the action in flight. Counts and the pending snapshot are
    /// unaffected: both cover pending and in-flight actions alike.
    fn begin_attempt(&self, id: Uuid) -> Result<QueuedAction, DispatchError> {
        let mut in_flight = self.lock_in_flight();
        let action = in_flight.get_mut(&id).ok_or(DispatchError::Lost(id))?;
        action.transition(ActionStatus::InFlight)?;
        Ok(action.clone())
    }

    /// Appends the log entry and retires the action under one lock, so the
    /// log grows and the pending count drops together.
    fn complete(&self, id: Uuid) -> Result<ActionOutcome, DispatchError> {
        let (action, entry, durable, snapshot) = {
            let mut in_flight = self.lock_in_flight();
            let mut action = in_flight.remove(&id).ok_or(DispatchError::Lost(id))?;
            action.transition(ActionStatus::Completed)?;

            let entry = LogEntry::now(action.category);
            let durable = match self.log.append(entry.clone()) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Action {} completed but was not durably logged: {}", id, e);
                    false
                }
            };
            self.publish(&in_flight);
            (action, entry, durable, self.snapshot_pending(&in_flight))
        };
        self.persist_pending(snapshot);

        tracing::info!("Synced {} action {}", action.category, id);
        Ok(ActionOutcome {
            action,
            entry,
            durable,
        })
    }

    fn fail_attempt(&self, id: Uuid, error: TransportError) -> Result<AfterFailure, DispatchError> {
        let (after, snapshot) = {
            let mut in_flight = self.lock_in_flight();
            let after = self.record_failure(&mut in_flight, id, error)?;
            (after, self.snapshot_pending(&in_flight))
        };
        self.persist_pending(snapshot);
        Ok(after)
    }

    fn record_failure(
        &self,
        in_flight: &mut InFlight,
        id: Uuid,
        error: TransportError,
    ) -> Result<AfterFailure, DispatchError> {
        let action = in_flight.get_mut(&id).ok_or(DispatchError::Lost(id))?;

        let attempt = action.retry_count;
        let retries = action.record_failure()?;

        if self.config.retry.allows_retry(retries) {
            action.transition(ActionStatus::Pending)?;
            let delay = self.config.retry.delay_for(attempt);
            tracing::debug!(
                "Attempt {} for action {} failed ({}), retrying in {}ms",
                retries,
                id,
                error,
                delay.as_millis()
            );
            self.publish(in_flight);
            return Ok(AfterFailure::RetryIn(delay));
        }

        action.transition(ActionStatus::Failed)?;
        in_flight.remove(&id);
        self.publish(in_flight);

        tracing::warn!("Action {} failed after {} attempt(s): {}", id, retries, error);
        Ok(AfterFailure::GiveUp(DispatchError::RetriesExhausted {
            id,
            attempts: retries,
            last_error: error,
        }))
    }

    /// Recomputes the counts. Called with the in-flight lock held.
    fn publish(&self, in_flight: &InFlight) {
        self.counts
            .send_replace(PendingCounts::from_actions(in_flight.values()));
    }

    /// Captures the set for the pending store. Called with the in-flight
    /// lock held so generations follow the order of changes.
    fn snapshot_pending(&self, in_flight: &InFlight) -> Option<PendingSnapshot> {
        self.pending_store.as_ref()?;
        Some(PendingSnapshot {
            generation: self.generation.fetch_add(1, Ordering::Relaxed) + 1,
            actions: snapshot(in_flight),
        })
    }

    /// Writes `snapshot` unless a newer one already landed. Called without
    /// the in-flight lock.
    fn persist_pending(&self, snapshot: Option<PendingSnapshot>) {
        let (Some(store), Some(snapshot)) = (&self.pending_store, snapshot) else {
            return;
        };

        let mut written = lock(&self.written);
        if snapshot.generation <= *written {
            return;
        }
        match store.persist(&snapshot.actions) {
            Ok(()) => *written = snapshot.generation,
            Err(e) => tracing::warn!("Failed to persist pending actions: {}", e),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn snapshot(in_flight: &InFlight) -> Vec<QueuedAction> {
    let mut actions: Vec<QueuedAction> = in_flight.values().cloned().collect();
    actions.sort_by_key(|a| (a.created_at, a.id));
    actions
}
