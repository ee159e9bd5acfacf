//! Wires the engine to the file store, HTTP transport and probe.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use offline_queue_core::{
    ActionHandle, ActionOutcome, DispatchEngine, DispatchError, FileStore, LogStore, PendingCounts,
    PendingStore, Reachability, SyncLog, Transport,
};

use super::http::HttpTransport;
use super::probe::spawn_probe;
use crate::config::Config;

/// Why a drain stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStop {
    /// Every handle resolved.
    Finished,
    TimedOut,
    Interrupted,
}

/// Result of waiting on a batch of handles.
#[derive(Debug)]
pub struct DrainReport {
    pub completed: Vec<ActionOutcome>,
    pub failed: Vec<DispatchError>,
    /// Counts left in the queue when the drain stopped.
    pub remaining: PendingCounts,
    pub stop: DrainStop,
}

/// A running queue: engine plus reachability probe.
pub struct QueueRuntime {
    engine: DispatchEngine,
    probe: Option<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl QueueRuntime {
    /// Opens the data directory, rehydrates the log and starts probing.
    pub fn start(config: &Config) -> Result<Self, reqwest::Error> {
        let transport = Arc::new(HttpTransport::new(config.endpoint.value.clone())?);
        tracing::debug!("Delivering actions to {}", transport.endpoint());
        let reachability = Reachability::new(false);
        let mut runtime = Self::with_transport(config, transport, reachability.clone());

        runtime.probe = Some(spawn_probe(
            reachability,
            config.health_url().to_string(),
            config.probe_interval(),
            runtime.shutdown.subscribe(),
        ));
        Ok(runtime)
    }

    /// Builds the runtime around an arbitrary transport, without a probe.
    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn Transport>,
        reachability: Reachability,
    ) -> Self {
        let kv = Arc::new(FileStore::new(config.data_dir.value.clone()));
        let log = Arc::new(SyncLog::new(LogStore::new(kv.clone())));
        let loaded = log.rehydrate();
        tracing::debug!(
            "Loaded {} log entr(ies) from {}",
            loaded,
            config.data_dir.value.display()
        );

        let engine = DispatchEngine::builder(transport, log)
            .config(config.engine_config())
            .reachability(reachability)
            .pending_store(PendingStore::new(kv))
            .build();

        let (shutdown, _) = watch::channel(false);
        Self {
            engine,
            probe: None,
            shutdown,
        }
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// Waits for `handles` until all resolve, `timeout` elapses, or Ctrl-C.
    pub async fn drain(&self, handles: Vec<ActionHandle>, timeout: Duration) -> DrainReport {
        let mut waiting: FuturesUnordered<ActionHandle> = handles.into_iter().collect();
        let mut completed = Vec::new();
        let mut failed = Vec::new();

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let stop = loop {
            tokio::select! {
                next = waiting.next() => match next {
                    Some(Ok(outcome)) => completed.push(outcome),
                    Some(Err(e)) => failed.push(e),
                    None => break DrainStop::Finished,
                },
                _ = &mut deadline => break DrainStop::TimedOut,
                _ = &mut ctrl_c => break DrainStop::Interrupted,
            }
        };

        DrainReport {
            completed,
            failed,
            remaining: self.engine.pending_counts(),
            stop,
        }
    }

    /// Stops dispatch and the probe. Unfinished actions stay in the pending
    /// store for the next run.
    pub async fn stop(mut self) {
        self.engine.shutdown();
        self.shutdown.send_replace(true);
        if let Some(probe) = self.probe.take() {
            let _ = probe.await;
        }
    }
}
