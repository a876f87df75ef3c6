//! Operator roster for the dispatcher
//!
//! Operators are created once, at startup, and live for the whole process. The
//! roster size is fixed at construction and each slot is named by the next letter
//! of [`OPERATOR_ALPHABET`]:
//!
//! ```rust
//! use switchboard_call_engine::agent::{roster, OperatorStatus};
//!
//! let operators = roster(3).unwrap();
//! let ids: Vec<String> = operators.iter().map(|op| op.id.to_string()).collect();
//! assert_eq!(ids, ["A", "B", "C"]);
//! assert!(operators.iter().all(|op| op.status == OperatorStatus::Available));
//! ```
//!
//! # Operator Status
//!
//! - [`OperatorStatus::Available`]: ready to be offered a call
//! - [`OperatorStatus::Ringing`]: a call is being offered
//! - [`OperatorStatus::OnCall`]: the offered call was answered

pub mod types;

pub use types::{Operator, OperatorId, OperatorStatus, MAX_OPERATORS, OPERATOR_ALPHABET};

use crate::error::{CallCenterError, Result};

/// Build a roster of `count` available operators named `A`, `B`, ...
pub fn roster(count: usize) -> Result<Vec<Operator>> {
    validate_operator_count(count)?;
    Ok((0..count)
        .filter_map(OperatorId::from_index)
        .map(Operator::new)
        .collect())
}

/// Check that `count` operators can be named from the alphabet
pub fn validate_operator_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(CallCenterError::configuration(
            "operator count must be at least 1",
        ));
    }
    if count > MAX_OPERATORS {
        return Err(CallCenterError::configuration(format!(
            "operator count {} exceeds the {} available identifiers",
            count, MAX_OPERATORS
        )));
    }
    Ok(())
}
