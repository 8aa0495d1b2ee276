//! Monitor State Machine
//!
//! Single source of truth for which lifecycle transitions are legal.

use crate::domain::shared::DomainError;

use super::state::{ExitLeg, MonitorState};

/// Transition table for [`MonitorState`].
pub struct MonitorStateMachine;

impl MonitorStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub const fn is_valid_transition(from: MonitorState, to: MonitorState) -> bool {
        use MonitorState as S;
        matches!(
            (from, to),
            // Profit target
            (S::AwaitingFill, S::Filled)
                | (S::AwaitingFill, S::TimedOut)
                | (S::AwaitingFill, S::CancelFailed)
                | (S::AwaitingFill, S::Failed)
                | (S::AwaitingFill, S::Detached)
                // Bracket entry
                | (S::AwaitingEntryFill, S::AwaitingConfirmation)
                | (S::AwaitingEntryFill, S::TimedOut)
                | (S::AwaitingEntryFill, S::CancelFailed)
                | (S::AwaitingEntryFill, S::Failed)
                | (S::AwaitingEntryFill, S::Detached)
                // Confirmation
                | (S::AwaitingConfirmation, S::BracketActive)
                | (S::AwaitingConfirmation, S::ConfirmationTimedOut)
                | (S::AwaitingConfirmation, S::Failed)
                | (S::AwaitingConfirmation, S::Detached)
                // Exit legs
                | (S::BracketActive, S::Complete(_))
                | (S::BracketActive, S::Failed)
                | (S::BracketActive, S::Detached)
        )
    }

    /// Validate a state transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the table does not allow it.
    pub fn validate_transition(from: MonitorState, to: MonitorState) -> Result<(), DomainError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(DomainError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
                reason: Self::transition_error_reason(from),
            })
        }
    }

    fn transition_error_reason(from: MonitorState) -> String {
        if from.is_terminal() {
            format!("monitor already finished in {from}")
        } else {
            let allowed: Vec<String> = Self::valid_next_states(from)
                .iter()
                .map(ToString::to_string)
                .collect();
            format!("{from} can only move to {}", allowed.join(", "))
        }
    }

    /// Every state reachable in one step from `from`; empty for terminal states.
    #[must_use]
    pub fn valid_next_states(from: MonitorState) -> Vec<MonitorState> {
        use MonitorState as S;
        match from {
            S::AwaitingFill => vec![S::Filled, S::TimedOut, S::CancelFailed, S::Failed, S::Detached],
            S::AwaitingEntryFill => vec![
                S::AwaitingConfirmation,
                S::TimedOut,
                S::CancelFailed,
                S::Failed,
                S::Detached,
            ],
            S::AwaitingConfirmation => vec![
                S::BracketActive,
                S::ConfirmationTimedOut,
                S::Failed,
                S::Detached,
            ],
            S::BracketActive => vec![
                S::Complete(ExitLeg::Stop),
                S::Complete(ExitLeg::Profit),
                S::Failed,
                S::Detached,
            ],
            // Terminal states
            S::Filled
            | S::Complete(_)
            | S::TimedOut
            | S::CancelFailed
            | S::ConfirmationTimedOut
            | S::Failed
            | S::Detached => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [MonitorState; 12] = [
        MonitorState::AwaitingFill,
        MonitorState::Filled,
        MonitorState::AwaitingEntryFill,
        MonitorState::AwaitingConfirmation,
        MonitorState::BracketActive,
        MonitorState::Complete(ExitLeg::Stop),
        MonitorState::Complete(ExitLeg::Profit),
        MonitorState::TimedOut,
        MonitorState::CancelFailed,
        MonitorState::ConfirmationTimedOut,
        MonitorState::Failed,
        MonitorState::Detached,
    ];

    #[test]
    fn profit_target_flow() {
        assert!(MonitorStateMachine::is_valid_transition(
            MonitorState::AwaitingFill,
            MonitorState::Filled
        ));
        assert!(!MonitorStateMachine::is_valid_transition(
            MonitorState::AwaitingFill,
            MonitorState::AwaitingConfirmation
        ));
    }

    #[test]
    fn bracket_flow() {
        let path = [
            MonitorState::AwaitingEntryFill,
            MonitorState::AwaitingConfirmation,
            MonitorState::BracketActive,
            MonitorState::Complete(ExitLeg::Profit),
        ];
        for pair in path.windows(2) {
            assert!(MonitorStateMachine::validate_transition(pair[0], pair[1]).is_ok());
        }
    }

    #[test]
    fn confirmation_cannot_time_out_before_fill() {
        assert!(!MonitorStateMachine::is_valid_transition(
            MonitorState::AwaitingEntryFill,
            MonitorState::ConfirmationTimedOut
        ));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            assert!(MonitorStateMachine::valid_next_states(*from).is_empty());
            for to in ALL {
                assert!(!MonitorStateMachine::is_valid_transition(*from, to));
            }
        }
    }

    #[test]
    fn table_and_next_states_agree() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    MonitorStateMachine::is_valid_transition(from, to),
                    MonitorStateMachine::valid_next_states(from).contains(&to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn invalid_transition_error() {
        let err = MonitorStateMachine::validate_transition(
            MonitorState::TimedOut,
            MonitorState::Filled,
        )
        .unwrap_err();
        assert!(err.to_string().contains("already finished"));
    }

    #[test]
    fn rejected_transition_lists_allowed_states() {
        let err = MonitorStateMachine::validate_transition(
            MonitorState::AwaitingConfirmation,
            MonitorState::Filled,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "monitor cannot move from AWAITING_CONFIRMATION to FILLED: AWAITING_CONFIRMATION can only \
             move to BRACKET_ACTIVE, CONFIRMATION_TIMED_OUT, FAILED, DETACHED"
        );
    }
}
