//! Monitor lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which exit leg of a bracket completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitLeg {
    /// Protective stop-limit leg.
    Stop,
    /// Profit-target limit leg.
    Profit,
}

impl fmt::Display for ExitLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => write!(f, "stop"),
            Self::Profit => write!(f, "profit"),
        }
    }
}

/// Lifecycle state of a monitored entry order.
///
/// `AwaitingFill` and `Filled` belong to the simple profit-target flow; the
/// `AwaitingEntryFill → AwaitingConfirmation → BracketActive → Complete`
/// chain belongs to confirmation-gated flows. The failure states are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorState {
    /// Profit target: waiting for the entry to fill.
    AwaitingFill,
    /// Profit target: entry filled, exit submitted.
    Filled,
    /// Bracket: waiting for the entry to fill.
    AwaitingEntryFill,
    /// Bracket: entry filled, waiting for price confirmation.
    AwaitingConfirmation,
    /// Bracket: exit legs placed and supervised.
    BracketActive,
    /// Bracket: one exit leg filled.
    Complete(ExitLeg),
    /// Entry canceled after the fill timeout.
    TimedOut,
    /// The timeout cancel was not acknowledged.
    CancelFailed,
    /// Confirmation never came; position left open without exits.
    ConfirmationTimedOut,
    /// Non-retryable broker error.
    Failed,
    /// Tracking released; broker orders untouched.
    Detached,
}

impl MonitorState {
    /// Returns true once the monitor has stopped polling.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Self::AwaitingFill
                | Self::AwaitingEntryFill
                | Self::AwaitingConfirmation
                | Self::BracketActive
        )
    }

    /// Returns true while waiting on the entry fill.
    #[must_use]
    pub const fn is_awaiting_entry(&self) -> bool {
        matches!(self, Self::AwaitingFill | Self::AwaitingEntryFill)
    }

    /// Stable upper-case tag used in events, metrics and queries.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::AwaitingFill => "AWAITING_FILL",
            Self::Filled => "FILLED",
            Self::AwaitingEntryFill => "AWAITING_ENTRY_FILL",
            Self::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            Self::BracketActive => "BRACKET_ACTIVE",
            Self::Complete(ExitLeg::Stop) => "COMPLETE_STOP",
            Self::Complete(ExitLeg::Profit) => "COMPLETE_PROFIT",
            Self::TimedOut => "TIMED_OUT",
            Self::CancelFailed => "CANCEL_FAILED",
            Self::ConfirmationTimedOut => "CONFIRMATION_TIMED_OUT",
            Self::Failed => "FAILED",
            Self::Detached => "DETACHED",
        }
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
