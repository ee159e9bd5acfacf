//! `offq submit`: queue a new action.

use chrono::Utc;
use clap::Args;
use serde_json::json;

use offline_queue_core::ActionCategory;

use super::print_drain_report;
use crate::config::Config;
use crate::sync::QueueRuntime;

/// Queue an action for delivery
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Action category (small, large)
    category: ActionCategory,

    /// JSON payload (default: a simulated payload)
    #[arg(long, short)]
    payload: Option<String>,

    /// Only queue the action; deliver it on the next `flush`
    #[arg(long)]
    no_wait: bool,
}

impl SubmitCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let payload: serde_json::Value = match &self.payload {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| format!("Invalid --payload JSON: {}", e))?,
            None => json!({ "simulated": true, "timestamp": Utc::now().timestamp_millis() }),
        };

        let runtime = QueueRuntime::start(config)?;

        if self.no_wait {
            let queued = runtime.engine().pending_counts().total;
            let handle = runtime.engine().submit(self.category, payload);
            println!("Queued {} action {}", handle.category(), handle.id());
            if queued > 0 {
                println!("{} earlier action(s) still queued.", queued);
            }
            runtime.stop().await;
            return Ok(());
        }

        // Earlier work goes out first, together with the new action.
        let mut handles = runtime.engine().restore_pending();
        if !handles.is_empty() {
            println!("Resuming {} earlier action(s)", handles.len());
        }
        let handle = runtime.engine().submit(self.category, payload);
        println!("Queued {} action {}", handle.category(), handle.id());
        handles.push(handle);

        let report = runtime.drain(handles, config.drain_timeout()).await;
        print_drain_report(&report);
        runtime.stop().await;

        Ok(())
    }
}
