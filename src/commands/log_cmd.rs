//! `offq log`: show completed actions.

use std::sync::Arc;

use clap::Args;

use offline_queue_core::{FileStore, LogStore, SyncLog};

use super::OutputFormat;
use crate::config::Config;

/// Show the sync log, newest first
#[derive(Debug, Args)]
pub struct LogCommand {
    /// Show at most this many entries
    #[arg(long, short)]
    limit: Option<usize>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl LogCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let kv = Arc::new(FileStore::new(config.data_dir.value.clone()));
        let log = SyncLog::new(LogStore::new(kv));
        log.rehydrate();

        let entries = log.entries();
        let shown = &entries[..self.limit.unwrap_or(entries.len()).min(entries.len())];

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(shown)?);
            }
            OutputFormat::Text => {
                if shown.is_empty() {
                    println!("No synced actions yet.");
                    return Ok(());
                }
                for entry in shown {
                    println!("{}", entry);
                }
                if shown.len() < entries.len() {
                    println!("... {} more", entries.len() - shown.len());
                }
            }
        }

        Ok(())
    }
}
