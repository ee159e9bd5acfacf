//! Scripted transport for engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::{ActionCategory, QueuedAction};
use crate::reachability::Reachability;
use crate::transport::{Transport, TransportError};

#[derive(Debug, Clone)]
pub struct Call {
    pub id: Uuid,
    pub category: ActionCategory,
    pub timeout: Duration,
    pub at: Instant,
}

/// Succeeds unless told to fail; records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    failures: Mutex<VecDeque<TransportError>>,
    calls: Mutex<Vec<Call>>,
    delay: Mutex<Option<Duration>>,
    offline_on_failure: Mutex<Option<Reachability>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` calls fail with `error`.
    pub fn fail_next(&self, n: usize, error: TransportError) {
        let mut failures = self.failures.lock().unwrap();
        failures.extend(std::iter::repeat(error).take(n));
    }

    /// Every call takes `delay` before answering.
    pub fn delay_each(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Flip `reachability` offline whenever a call fails.
    pub fn go_offline_on_failure(&self, reachability: Reachability) {
        *self.offline_on_failure.lock().unwrap() = Some(reachability);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, action: &QueuedAction, timeout: Duration) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(Call {
            id: action.id,
            category: action.category,
            timeout,
            at: Instant::now(),
        });

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().unwrap().pop_front();
        match failure {
            Some(error) => {
                let reachability = self.offline_on_failure.lock().unwrap().clone();
                if let Some(reachability) = reachability {
                    reachability.set_online(false);
                }
                Err(error)
            }
            None => Ok(()),
        }
    }
}
