//! Errors raised by the domain model itself, before any broker is involved.

use thiserror::Error;

/// A rule of the order or monitor model was broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The monitor lifecycle has no edge between these two states.
    #[error("monitor cannot move from {from} to {to}: {reason}")]
    InvalidStateTransition {
        /// State the monitor is in.
        from: String,
        /// State that was requested.
        to: String,
        /// Why the edge is missing.
        reason: String,
    },

    /// A quantity, symbol, price or exit setting is unusable.
    #[error("{field} is invalid: {message}")]
    InvalidValue {
        /// Offending field, e.g. `stop_price`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// A monitored order's write-once data was written again.
    #[error("monitored order rule '{invariant}' broken: {detail}")]
    InvariantViolation {
        /// The rule, e.g. "fill price is written once".
        invariant: String,
        /// Order id and the conflicting values.
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_transition_names_both_states() {
        let err = DomainError::InvalidStateTransition {
            from: "TIMED_OUT".to_string(),
            to: "FILLED".to_string(),
            reason: "TIMED_OUT is terminal".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "monitor cannot move from TIMED_OUT to FILLED: TIMED_OUT is terminal"
        );
    }

    #[test]
    fn derived_price_error_names_the_leg() {
        let err = DomainError::InvalidValue {
            field: "stop_price".to_string(),
            message: "derived price -3 from fill 2 is not positive".to_string(),
        };
        assert!(err.to_string().starts_with("stop_price is invalid"));
    }

    #[test]
    fn second_fill_reports_the_rule() {
        let err = DomainError::InvariantViolation {
            invariant: "fill price is written once".to_string(),
            detail: "mock-1 already filled at 100".to_string(),
        };
        assert!(err.to_string().contains("'fill price is written once'"));
        assert!(err.to_string().contains("mock-1"));
    }
}
