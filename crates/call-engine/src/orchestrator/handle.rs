//! Dispatcher actor: one task owns the state machine, every gateway talks to it
//! through a cloneable [`DispatcherHandle`].

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::{CallCenterError, Result};
use crate::protocol::Command;

use super::core::Dispatcher;
use super::types::{DispatcherStats, Notification};

// Default mailbox capacity
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

enum Request {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<Vec<Notification>>>,
    },
    Stats {
        reply: oneshot::Sender<DispatcherStats>,
    },
}

/// Cloneable sender side of the dispatcher task
///
/// Requests from all clones are applied one at a time in arrival order, so a
/// transition and its chained re-allocation never interleave with another event.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<Request>,
}

impl DispatcherHandle {
    /// Move `dispatcher` into a new task and return a handle to it
    ///
    /// The task stops once every handle has been dropped.
    pub fn spawn(dispatcher: Dispatcher, channel_capacity: Option<usize>) -> Self {
        let capacity = channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY).max(1);
        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(run(dispatcher, rx));
        Self { tx }
    }

    /// Apply one command and wait for its outcome
    pub async fn execute(&self, command: Command) -> Result<Vec<Notification>> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request::Command { command, reply })
            .await
            .map_err(|_| CallCenterError::internal("dispatcher task has stopped"))?;
        response
            .await
            .map_err(|_| CallCenterError::internal("dispatcher task dropped the request"))?
    }

    pub async fn stats(&self) -> Result<DispatcherStats> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request::Stats { reply })
            .await
            .map_err(|_| CallCenterError::internal("dispatcher task has stopped"))?;
        response
            .await
            .map_err(|_| CallCenterError::internal("dispatcher task dropped the request"))
    }
}

async fn run(mut dispatcher: Dispatcher, mut rx: mpsc::Receiver<Request>) {
    info!(
        operators = dispatcher.operator_count(),
        "dispatcher task started"
    );
    while let Some(request) = rx.recv().await {
        match request {
            Request::Command { command, reply } => {
                let result = dispatcher.handle(&command);
                match &result {
                    Ok(notifications) => {
                        debug!(%command, emitted = notifications.len(), "event applied")
                    }
                    Err(e) => warn!(%command, "event rejected: {}", e),
                }
                if reply.send(result).is_err() {
                    debug!(%command, "requester went away before the reply");
                }
            }
            Request::Stats { reply } => {
                let _ = reply.send(dispatcher.stats());
            }
        }
    }
    info!("dispatcher task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::types::CallId;

    #[tokio::test]
    async fn test_handle_serializes_commands_from_clones() {
        let handle = DispatcherHandle::spawn(Dispatcher::new(2).unwrap(), Some(4));

        let mut tasks = Vec::new();
        for id in 1..=6i64 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle.execute(Command::Call(CallId(id))).await
            }));
        }
        for task in tasks {
            let notifications = task.await.unwrap().unwrap();
            assert_eq!(notifications.len(), 2);
        }

        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.ringing, 2);
        assert_eq!(stats.queued_calls, 4);
    }

    #[tokio::test]
    async fn test_handle_reports_event_errors() {
        let handle = DispatcherHandle::spawn(Dispatcher::new(1).unwrap(), None);
        let err = handle.execute(Command::Hangup(CallId(1))).await.unwrap_err();
        assert!(matches!(err, CallCenterError::InvalidTransition(_)));
        // the task keeps serving after a failed event
        assert_eq!(handle.execute(Command::Call(CallId(1))).await.unwrap().len(), 2);
    }
}
