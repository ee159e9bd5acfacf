mod action;
mod category;
mod log_entry;

pub use action::{ActionStatus, InvalidTransition, QueuedAction};
pub use category::ActionCategory;
pub use log_entry::LogEntry;
