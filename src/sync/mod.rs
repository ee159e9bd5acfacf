//! Network side of the queue: HTTP delivery, reachability probing, and the
//! runtime that ties them to the core engine.

pub mod http;
pub mod probe;
pub mod runtime;
#[cfg(test)]
mod test_server;

pub use http::HttpTransport;
pub use probe::check_server;
pub use runtime::{DrainReport, DrainStop, QueueRuntime};
