//! # Pending Call Queue
//!
//! FIFO holding calls that arrived while every operator was busy. Calls join at
//! the back and are handed out from the front; a hangup can pull a call out of
//! the middle without disturbing the order of the rest.

use std::collections::VecDeque;

use crate::orchestrator::types::CallId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingQueue {
    calls: VecDeque<CallId>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call to the back of the queue
    pub fn enqueue(&mut self, call: CallId) {
        self.calls.push_back(call);
    }

    /// Take the longest-waiting call
    pub fn dequeue(&mut self) -> Option<CallId> {
        self.calls.pop_front()
    }

    /// Remove `call` wherever it is; returns whether it was queued
    pub fn remove(&mut self, call: CallId) -> bool {
        match self.calls.iter().position(|queued| *queued == call) {
            Some(position) => {
                self.calls.remove(position);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, call: CallId) -> bool {
        self.calls.contains(&call)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Queued calls, front first
    pub fn iter(&self) -> impl Iterator<Item = CallId> + '_ {
        self.calls.iter().copied()
    }
}
