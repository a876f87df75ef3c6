//! Error types for the call engine

use thiserror::Error;

/// Result alias used across the call engine
pub type Result<T> = std::result::Result<T, CallCenterError>;

/// Main error type for dispatcher and gateway operations
///
/// None of these are fatal: a failed event leaves the dispatcher exactly as it
/// was before the event and the gateway keeps serving.
#[derive(Error, Debug)]
pub enum CallCenterError {
    /// Input could not be decoded into a command
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// Operator identifier is not part of the configured roster
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Target call or operator is not in the state the transition requires
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Socket and stream errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal errors (broken invariants, dead dispatcher task)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CallCenterError {
    /// Create a malformed event error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedEvent(msg.into())
    }

    /// Create an unknown operator error
    pub fn unknown_operator(msg: impl Into<String>) -> Self {
        Self::UnknownOperator(msg.into())
    }

    /// Create an invalid transition error
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error was caused by the event itself rather than the process
    pub fn is_event_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedEvent(_) | Self::UnknownOperator(_) | Self::InvalidTransition(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CallCenterError::invalid_transition("operator A is not ringing");
        assert_eq!(err.to_string(), "Invalid transition: operator A is not ringing");

        let err = CallCenterError::unknown_operator("Q");
        assert_eq!(err.to_string(), "Unknown operator: Q");
    }

    #[test]
    fn test_event_error_classification() {
        assert!(CallCenterError::malformed("x").is_event_error());
        assert!(CallCenterError::unknown_operator("x").is_event_error());
        assert!(CallCenterError::invalid_transition("x").is_event_error());
        assert!(!CallCenterError::configuration("x").is_event_error());
        assert!(!CallCenterError::internal("x").is_event_error());
    }
}
