//! Boundary to whatever actually delivers an action to the remote endpoint.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::QueuedAction;

/// A failed delivery attempt. Every variant is retryable from the engine's
/// point of view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("Server returned status {0}")]
    Status(u16),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Sends one action. Implementations must honour `timeout` themselves and
/// must not retry; retry and backoff belong to the dispatch engine.
///
/// Dropping the returned future cancels the attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, action: &QueuedAction, timeout: Duration) -> Result<(), TransportError>;
}
