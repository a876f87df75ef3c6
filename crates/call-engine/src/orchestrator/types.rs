//! Shared types for the dispatcher

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::OperatorId;
use crate::error::{CallCenterError, Result};

/// Externally supplied call identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(pub i64);

impl From<i64> for CallId {
    fn from(id: i64) -> Self {
        CallId(id)
    }
}

impl std::str::FromStr for CallId {
    type Err = CallCenterError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        trimmed
            .parse::<i64>()
            .map(CallId)
            .map_err(|_| CallCenterError::malformed(format!("Unknown argument {}", trimmed)))
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a known call currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallState {
    /// Waiting in the pending queue
    Queued,
    /// Offered to an operator who has not answered yet
    Ringing(OperatorId),
    /// Answered and being handled
    Active(OperatorId),
}

/// One outcome message produced by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Received(CallId),
    Ringing { call: CallId, operator: OperatorId },
    Queued(CallId),
    Answered { call: CallId, operator: OperatorId },
    Rejected { call: CallId, operator: OperatorId },
    Missed(CallId),
    Finished { call: CallId, operator: OperatorId },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Received(call) => write!(f, "Call {} received", call),
            Notification::Ringing { call, operator } => {
                write!(f, "Call {} ringing for operator {}", call, operator)
            }
            Notification::Queued(call) => write!(f, "Call {} waiting in queue", call),
            Notification::Answered { call, operator } => {
                write!(f, "Call {} answered by operator {}", call, operator)
            }
            Notification::Rejected { call, operator } => {
                write!(f, "Call {} rejected by operator {}", call, operator)
            }
            Notification::Missed(call) => write!(f, "Call {} missed", call),
            Notification::Finished { call, operator } => {
                write!(f, "Call {} finished and operator {} available", call, operator)
            }
        }
    }
}

/// Point-in-time counters for the roster and queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStats {
    pub total_operators: usize,
    pub available: usize,
    pub ringing: usize,
    pub on_call: usize,
    pub queued_calls: usize,
}
