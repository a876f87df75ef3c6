//! # Switchboard Call Engine
//!
//! Call routing for a small call center: incoming calls ring the first free
//! operator, wait in a FIFO queue when everyone is busy, and move on as operators
//! answer, reject or hang up.
//!
//! ## Overview
//!
//! - **[`orchestrator`]**: the [`Dispatcher`] state machine and its actor handle
//! - **[`agent`]**: operator identifiers, statuses and the fixed roster
//! - **[`queue`]**: the pending-call FIFO
//! - **[`protocol`]**: typed commands and the newline-delimited JSON wire format
//! - **[`prompt`]**, **[`server`]**, **[`client`]**: the gateways
//! - **[`notifier`]**: where outcome messages are written
//! - **[`config`]**, **[`logging`]**, **[`error`]**: ambient plumbing
//!
//! ## Quick Start
//!
//! ```rust
//! use switchboard_call_engine::prelude::*;
//!
//! let mut dispatcher = Dispatcher::new(2).unwrap();
//! for id in 1..=3 {
//!     dispatcher.receive_call(CallId(id)).unwrap();
//! }
//! let answered = dispatcher.answer_call("B".parse().unwrap()).unwrap();
//! assert_eq!(answered[0].to_string(), "Call 2 answered by operator B");
//! assert_eq!(dispatcher.queued_calls(), vec![CallId(3)]);
//! ```

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod orchestrator;
pub mod prompt;
pub mod protocol;
pub mod queue;
pub mod server;

pub use client::CallCenterClient;
pub use config::CallCenterConfig;
pub use error::{CallCenterError, Result};
pub use orchestrator::{Dispatcher, DispatcherHandle};
pub use server::CallCenterServer;

/// Commonly used types
pub mod prelude {
    pub use crate::agent::{Operator, OperatorId, OperatorStatus};
    pub use crate::client::CallCenterClient;
    pub use crate::config::CallCenterConfig;
    pub use crate::error::{CallCenterError, Result};
    pub use crate::notifier::{ConsoleNotifier, JsonLineNotifier, Notifier};
    pub use crate::orchestrator::{
        CallId, CallState, Dispatcher, DispatcherHandle, DispatcherStats, Notification,
    };
    pub use crate::prompt::{CommandSink, Prompt};
    pub use crate::protocol::{Command, Request, Response};
    pub use crate::server::CallCenterServer;
}
