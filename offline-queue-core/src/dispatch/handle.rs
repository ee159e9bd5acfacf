use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::models::{ActionCategory, InvalidTransition, LogEntry, QueuedAction};
use crate::transport::TransportError;

/// Terminal failure of a submitted action.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Action {id} failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        id: Uuid,
        attempts: u32,
        last_error: TransportError,
    },
    /// The engine shut down before the action reached a terminal state.
    #[error("Action {0} was interrupted by shutdown")]
    Interrupted(Uuid),
    #[error("Action {0} is no longer tracked by the engine")]
    Lost(Uuid),
    #[error(transparent)]
    InvalidState(#[from] InvalidTransition),
}

/// A successfully delivered action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Final state of the action (status `completed`).
    pub action: QueuedAction,
    /// Entry appended to the sync log for this completion.
    pub entry: LogEntry,
    /// False if the log entry could not be persisted.
    pub durable: bool,
}

pub(crate) type OutcomeSender = oneshot::Sender<Result<ActionOutcome, DispatchError>>;

/// Resolves once the action is completed or has failed for good.
///
/// Can be awaited directly. Dropping the handle does not cancel the action.
#[derive(Debug)]
pub struct ActionHandle {
    id: Uuid,
    category: ActionCategory,
    rx: oneshot::Receiver<Result<ActionOutcome, DispatchError>>,
}

impl ActionHandle {
    pub(crate) fn new(action: &QueuedAction) -> (Self, OutcomeSender) {
        let (tx, rx) = oneshot::channel();
        let handle = Self {
            id: action.id,
            category: action.category,
            rx,
        };
        (handle, tx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn category(&self) -> ActionCategory {
        self.category
    }
}

impl Future for ActionHandle {
    type Output = Result<ActionOutcome, DispatchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DispatchError::Interrupted(id))))
    }
}
