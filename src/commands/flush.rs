//! `offq flush`: deliver everything left in the queue.

use clap::Args;

use super::print_drain_report;
use crate::config::Config;
use crate::sync::QueueRuntime;

/// Deliver queued actions, waiting for the network if needed
#[derive(Debug, Args)]
pub struct FlushCommand {
    /// Seconds to wait before giving up (default: drain_timeout_secs)
    #[arg(long)]
    timeout: Option<u64>,
}

impl FlushCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let runtime = QueueRuntime::start(config)?;
        let handles = runtime.engine().restore_pending();

        if handles.is_empty() {
            println!("Queue is empty.");
            runtime.stop().await;
            return Ok(());
        }

        println!("Flushing {} queued action(s)...", handles.len());
        let timeout = self
            .timeout
            .map(std::time::Duration::from_secs)
            .unwrap_or_else(|| config.drain_timeout());

        let report = runtime.drain(handles, timeout).await;
        print_drain_report(&report);
        runtime.stop().await;

        Ok(())
    }
}
