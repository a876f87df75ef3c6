//! # Call Routing Orchestration
//!
//! The dispatcher is the only component with real state. It owns a fixed operator
//! roster and a pending-call queue and reacts to four events:
//!
//! ```text
//!            call                 answer               hangup
//! Queued ─────────▶ Ringing ───────────▶ OnCall ───────────▶ finished
//!   │  (free operator)  │ │
//!   │ hangup            │ └── hangup ──▶ missed
//!   ▼                   │
//! missed                └── reject ──▶ another free operator, the same one, or parked
//! ```
//!
//! ## Modules
//!
//! - [`core`]: the [`Dispatcher`] state machine
//! - [`handle`]: actor task serializing events from many gateways
//! - [`types`]: call ids, call states, outcome notifications and stats
//!
//! ## Example
//!
//! ```rust
//! use switchboard_call_engine::orchestrator::{CallId, Dispatcher};
//!
//! let mut dispatcher = Dispatcher::new(2).unwrap();
//! dispatcher.receive_call(CallId(1)).unwrap();
//! dispatcher.receive_call(CallId(2)).unwrap();
//! let out = dispatcher.receive_call(CallId(3)).unwrap();
//! assert_eq!(out[1].to_string(), "Call 3 waiting in queue");
//!
//! let out = dispatcher.hangup_call(CallId(1)).unwrap();
//! assert_eq!(out[0].to_string(), "Call 1 missed");
//! assert_eq!(out[1].to_string(), "Call 3 ringing for operator A");
//! ```

pub mod core;
pub mod handle;
pub mod types;

pub use self::core::Dispatcher;
pub use handle::DispatcherHandle;
pub use types::{CallId, CallState, DispatcherStats, Notification};
