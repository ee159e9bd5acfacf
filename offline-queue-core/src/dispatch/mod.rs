//! Action dispatch: online gating, retry with backoff, and completion
//! logging.
//!
//! ## Lifecycle
//!
//! 1. `submit` records the action as `pending` and spawns its task
//! 2. The task waits until the network is reachable (no retry budget used)
//! 3. The action goes `in_flight` and the transport is called with the
//!    category timeout
//! 4. On success the sync log is appended, then the action is retired
//! 5. On failure the retry count grows; the action sleeps
//!    `min(base * 2^n, max)` and returns to step 2, or fails for good once
//!    the retry cap is exceeded

mod counts;
mod engine;
mod handle;
mod policy;
#[cfg(test)]
mod testing;

pub use counts::PendingCounts;
pub use engine::{DispatchEngine, EngineBuilder};
pub use handle::{ActionHandle, ActionOutcome, DispatchError};
pub use policy::{
    CategoryTimeouts, EngineConfig, RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY,
    DEFAULT_MAX_RETRIES,
};
