use clap::ValueEnum;

use crate::sync::{DrainReport, DrainStop};

mod config_cmd;
mod flush;
mod log_cmd;
mod status;
mod submit;

pub use config_cmd::ConfigCommand;
pub use flush::FlushCommand;
pub use log_cmd::LogCommand;
pub use status::StatusCommand;
pub use submit::SubmitCommand;

#[derive(Debug, Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints the outcome of a drain for `submit` and `flush`.
pub(crate) fn print_drain_report(report: &DrainReport) {
    for outcome in &report.completed {
        let note = if outcome.durable {
            ""
        } else {
            " (log not saved)"
        };
        println!(
            "  ✓ {} {} synced at {}{}",
            outcome.action.category,
            outcome.action.id,
            outcome.entry.display_time(),
            note
        );
    }
    for error in &report.failed {
        println!("  ✗ {}", error);
    }

    match report.stop {
        DrainStop::Finished => {}
        DrainStop::TimedOut => println!("Timed out waiting for the network."),
        DrainStop::Interrupted => println!("Interrupted."),
    }
    if !report.remaining.is_empty() {
        println!(
            "{} will be retried on the next flush.",
            report.remaining
        );
    }
}
