//! `offq status`: queue depth and server reachability.

use std::sync::Arc;

use offline_queue_core::{ActionCategory, FileStore, LogStore, PendingCounts, PendingStore};

use crate::config::Config;
use crate::sync::check_server;

/// Show pending work and whether the server is reachable
#[derive(Debug, Default)]
pub struct StatusCommand;

impl StatusCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let kv = Arc::new(FileStore::new(config.data_dir.value.clone()));
        let pending = PendingStore::new(kv.clone()).load();
        let counts = PendingCounts::from_actions(&pending);
        let synced = LogStore::new(kv).load().len();

        println!("Queue Status");
        println!("============");
        println!();
        println!("Pending:   {}", counts.total);
        for category in ActionCategory::ALL {
            println!("  {:<7} {}", category.to_string(), counts.get(category));
        }
        let retrying = pending.iter().filter(|a| a.retry_count > 0).count();
        if retrying > 0 {
            println!("  ({} with failed attempts)", retrying);
        }
        println!("Synced:    {}", synced);
        println!();

        println!("Endpoint:  {}", config.endpoint.value);
        print!("Server:    ");
        let client = reqwest::Client::new();
        if check_server(&client, config.health_url()).await {
            println!("✓ reachable");
        } else {
            println!("✗ unreachable");
        }

        Ok(())
    }
}
