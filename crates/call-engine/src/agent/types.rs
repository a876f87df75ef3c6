//! Core types for operator management

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CallCenterError, Result};
use crate::orchestrator::types::CallId;

/// Identifier alphabet, one symbol per roster slot in construction order
pub const OPERATOR_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Largest roster the alphabet can name
pub const MAX_OPERATORS: usize = 26;

/// Operator identifier: a single uppercase letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct OperatorId(char);

impl OperatorId {
    /// Identifier of the operator in roster slot `index`
    pub fn from_index(index: usize) -> Option<Self> {
        OPERATOR_ALPHABET.chars().nth(index).map(OperatorId)
    }

    /// Position of this identifier in the alphabet
    pub fn index(&self) -> usize {
        (self.0 as u8 - b'A') as usize
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl std::str::FromStr for OperatorId {
    type Err = CallCenterError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Ok(OperatorId(c)),
            _ => Err(CallCenterError::malformed(format!(
                "operator id must be a single uppercase letter, got '{}'",
                trimmed
            ))),
        }
    }
}

impl TryFrom<String> for OperatorId {
    type Error = CallCenterError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operator status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorStatus {
    /// Free to take the next call
    Available,

    /// A call has been offered but not answered
    Ringing,

    /// Handling an answered call
    OnCall,
}

impl std::str::FromStr for OperatorStatus {
    type Err = CallCenterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(OperatorStatus::Available),
            "ringing" => Ok(OperatorStatus::Ringing),
            "oncall" => Ok(OperatorStatus::OnCall),
            _ => Err(CallCenterError::malformed(format!("Unknown operator status: {}", s))),
        }
    }
}

impl fmt::Display for OperatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorStatus::Available => write!(f, "available"),
            OperatorStatus::Ringing => write!(f, "ringing"),
            OperatorStatus::OnCall => write!(f, "oncall"),
        }
    }
}

/// A roster slot able to handle one call at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,

    pub status: OperatorStatus,

    /// Set exactly when `status` is not `Available`
    pub current_call: Option<CallId>,
}

impl Operator {
    /// Create an available operator with no call
    pub fn new(id: OperatorId) -> Self {
        Self {
            id,
            status: OperatorStatus::Available,
            current_call: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == OperatorStatus::Available
    }
}
