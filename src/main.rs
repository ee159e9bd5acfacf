use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod sync;

use commands::{ConfigCommand, FlushCommand, LogCommand, StatusCommand, SubmitCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "offq")]
#[command(version)]
#[command(about = "Durable offline action queue", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue an action and deliver it when the network allows
    Submit(SubmitCommand),

    /// Deliver everything left in the queue
    Flush(FlushCommand),

    /// Show the sync log
    Log(LogCommand),

    /// Show pending work and server reachability
    Status,

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offq=info,offline_queue_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Submit(cmd)) => cmd.run(&config).await?,
        Some(Commands::Flush(cmd)) => cmd.run(&config).await?,
        Some(Commands::Log(cmd)) => cmd.run(&config)?,
        Some(Commands::Status) => StatusCommand.run(&config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
