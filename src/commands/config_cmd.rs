use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;

use super::OutputFormat;
use crate::config::Config;

#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# offq configuration

# Directory for the sync log and queued actions (default: ~/.local/share/offq)
# data_dir: ~/.local/share/offq

# Where actions are delivered
endpoint: https://httpbin.org/post

# Probed for reachability (default: endpoint)
# health_url: https://httpbin.org/get

retry:
  max_retries: 3
  # unbounded: false
  base_delay_ms: 1000
  max_delay_ms: 30000

timeouts:
  small_ms: 2000
  large_ms: 5000

probe_interval_secs: 5
drain_timeout_secs: 60
"#;

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => print_text(config),
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = Config::default_config_path();

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'offq config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

fn print_text(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    if let Some(path) = &config.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        );
    }
    println!();

    println!("data_dir: {}", config.data_dir.value.display());
    println!("  source: {}", config.data_dir.source);
    println!();

    println!("endpoint: {}", config.endpoint.value);
    println!("  source: {}", config.endpoint.source);
    println!("health_url: {}", config.health_url());
    println!();

    let engine = config.engine_config();
    match engine.retry.max_retries {
        Some(n) => println!("max_retries: {}", n),
        None => println!("max_retries: unbounded"),
    }
    println!(
        "backoff: {}ms doubling, capped at {}ms",
        config.retry.base_delay_ms, config.retry.max_delay_ms
    );
    println!(
        "timeouts: small {}ms, large {}ms",
        config.timeouts.small_ms, config.timeouts.large_ms
    );
    println!("probe_interval_secs: {}", config.probe_interval_secs);
    println!("drain_timeout_secs: {}", config.drain_timeout_secs);
}
