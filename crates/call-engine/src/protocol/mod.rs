//! # Wire Protocol
//!
//! Gateways decode their input once, at the boundary, into a typed [`Command`].
//! The network gateway speaks JSON objects, one per line in each direction:
//!
//! ```text
//! client -> server   {"command": "call", "id": "42"}
//! server -> client   {"response": "Call 42 received"}
//! server -> client   {"response": "Call 42 ringing for operator A"}
//! ```
//!
//! `id` is decimal text for `call`/`hangup` and an operator letter for
//! `answer`/`reject`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::OperatorId;
use crate::error::{CallCenterError, Result};
use crate::orchestrator::types::CallId;

/// Line terminator written after every response object
pub const RESPONSE_TERMINATOR: &str = "\r\n";

/// A decoded dispatcher event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Call(CallId),
    Answer(OperatorId),
    Reject(OperatorId),
    Hangup(CallId),
}

impl Command {
    /// Build a command from its verb and textual argument
    pub fn parse(verb: &str, id: &str) -> Result<Self> {
        match verb {
            "call" => Ok(Command::Call(id.parse()?)),
            "answer" => Ok(Command::Answer(id.parse()?)),
            "reject" => Ok(Command::Reject(id.parse()?)),
            "hangup" => Ok(Command::Hangup(id.parse()?)),
            other => Err(CallCenterError::malformed(format!("unknown command '{}'", other))),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Command::Call(_) => "call",
            Command::Answer(_) => "answer",
            Command::Reject(_) => "reject",
            Command::Hangup(_) => "hangup",
        }
    }

    /// Textual argument as it travels on the wire
    pub fn argument(&self) -> String {
        match self {
            Command::Call(call) | Command::Hangup(call) => call.to_string(),
            Command::Answer(operator) | Command::Reject(operator) => operator.to_string(),
        }
    }

    pub fn to_request(&self) -> Request {
        Request {
            command: self.verb().to_string(),
            id: RequestId::Text(self.argument()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb(), self.argument())
    }
}

/// `id` field of a request; numbers are accepted for call ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Text(String),
    Number(i64),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Text(text) => write!(f, "{}", text),
            RequestId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Client-to-server event object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub command: String,
    pub id: RequestId,
}

impl Request {
    pub fn into_command(self) -> Result<Command> {
        Command::parse(&self.command, &self.id.to_string())
    }
}

/// Server-to-client message object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub response: String,
}

impl Response {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            response: message.into(),
        }
    }

    /// Response describing a failed event
    pub fn error(err: &CallCenterError) -> Self {
        Self::new(format!("Error: {}", err))
    }
}

/// Decode one request line into a command
pub fn decode_request(line: &str) -> Result<Command> {
    let request: Request = serde_json::from_str(line.trim())
        .map_err(|e| CallCenterError::malformed(format!("invalid request: {}", e)))?;
    request.into_command()
}

/// Encode a command as a request line (without terminator)
pub fn encode_request(command: &Command) -> Result<String> {
    Ok(serde_json::to_string(&command.to_request())?)
}

/// Encode a response line including its terminator
pub fn encode_response(message: &str) -> Result<String> {
    let mut line = serde_json::to_string(&Response::new(message))?;
    line.push_str(RESPONSE_TERMINATOR);
    Ok(line)
}

/// Decode one response line; `\n` and `\r\n` endings are both accepted
pub fn decode_response(line: &str) -> Result<Response> {
    serde_json::from_str(line.trim_end_matches(['\r', '\n']))
        .map_err(|e| CallCenterError::malformed(format!("invalid response: {}", e)))
}
