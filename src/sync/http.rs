//! HTTP transport: POSTs each action as JSON to the configured endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use offline_queue_core::{ActionCategory, QueuedAction, Transport, TransportError};

/// Size of the filler sent with large actions to simulate an upload.
pub const LARGE_PAYLOAD_BYTES: usize = 100 * 1024;

/// Delivers actions with `reqwest`. The per-attempt timeout is set on each
/// request, so a slow server surfaces as [`TransportError::Timeout`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("offq/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request body for an action.
    pub fn body(action: &QueuedAction) -> serde_json::Value {
        let mut body = json!({
            "type": action.category,
            "id": action.id,
            "payload": action.payload,
            "createdAt": action.created_at,
        });
        if action.category == ActionCategory::Large {
            body["largeData"] = json!("a".repeat(LARGE_PAYLOAD_BYTES));
        }
        body
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, action: &QueuedAction, timeout: Duration) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(&Self::body(action))
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        // Drain the body so the connection can be reused.
        response.bytes().await.map_err(|e| classify(e, timeout))?;
        Ok(())
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout)
    } else if error.is_builder() {
        TransportError::Rejected(error.to_string())
    } else {
        TransportError::Network(error.to_string())
    }
}
