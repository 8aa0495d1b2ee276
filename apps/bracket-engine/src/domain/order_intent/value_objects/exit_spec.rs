//! Exit specifications attached to an entry order.

use std::time::Duration;

use crate::domain::order_intent::errors::ValidationError;

use super::offset::Offset;

fn require_positive(timeout: Duration, field: &str) -> Result<Duration, ValidationError> {
    if timeout.is_zero() {
        return Err(ValidationError::NonPositiveTimeout {
            field: field.to_string(),
        });
    }
    Ok(timeout)
}

/// Take profit as soon as the entry fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitTarget {
    /// Distance of the exit limit from the fill price.
    pub offset: Offset,
    /// How long to wait for the entry fill before canceling it.
    pub fill_timeout: Duration,
}

impl ProfitTarget {
    /// Create a validated profit target.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveTimeout` for a zero fill timeout.
    pub fn new(offset: Offset, fill_timeout: Duration) -> Result<Self, ValidationError> {
        Ok(Self {
            offset,
            fill_timeout: require_positive(fill_timeout, "fill_timeout")?,
        })
    }
}

/// Confirmation-gated bracket: entry, confirmation, then stop + target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketSpec {
    /// How far price must move favorably from the fill before arming.
    pub confirmation: Offset,
    /// How long to wait for confirmation after the fill.
    pub confirmation_timeout: Duration,
    /// Stop-loss distance from the fill price.
    pub stop: Offset,
    /// Profit-target distance from the fill price.
    pub profit: Offset,
    /// How long to wait for the entry fill before canceling it.
    pub fill_timeout: Duration,
}

impl BracketSpec {
    /// Create a validated bracket specification.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveTimeout` for either zero timeout.
    pub fn new(
        confirmation: Offset,
        confirmation_timeout: Duration,
        stop: Offset,
        profit: Offset,
        fill_timeout: Duration,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            confirmation,
            confirmation_timeout: require_positive(confirmation_timeout, "confirmation_timeout")?,
            stop,
            profit,
            fill_timeout: require_positive(fill_timeout, "fill_timeout")?,
        })
    }
}

/// Confirmation-gated single stop: entry, confirmation, then one stop-limit exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedStopSpec {
    /// How far price must move favorably from the fill before arming.
    pub confirmation: Offset,
    /// How long to wait for confirmation after the fill.
    pub confirmation_timeout: Duration,
    /// Stop distance from the fill price.
    pub stop: Offset,
    /// How long to wait for the entry fill before canceling it.
    pub fill_timeout: Duration,
}

impl ConfirmedStopSpec {
    /// Create a validated confirmed-stop specification.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveTimeout` for either zero timeout.
    pub fn new(
        confirmation: Offset,
        confirmation_timeout: Duration,
        stop: Offset,
        fill_timeout: Duration,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            confirmation,
            confirmation_timeout: require_positive(confirmation_timeout, "confirmation_timeout")?,
            stop,
            fill_timeout: require_positive(fill_timeout, "fill_timeout")?,
        })
    }
}

/// What to do once the entry order fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSpec {
    /// Single profit-taking limit order.
    ProfitTarget(ProfitTarget),
    /// Stop-loss and profit-target pair after confirmation.
    Bracket(BracketSpec),
    /// Single stop after confirmation.
    ConfirmedStop(ConfirmedStopSpec),
}

impl ExitSpec {
    /// Entry fill timeout for any exit kind.
    #[must_use]
    pub const fn fill_timeout(&self) -> Duration {
        match self {
            Self::ProfitTarget(spec) => spec.fill_timeout,
            Self::Bracket(spec) => spec.fill_timeout,
            Self::ConfirmedStop(spec) => spec.fill_timeout,
        }
    }

    /// Confirmation timeout, for confirmation-gated exits.
    #[must_use]
    pub const fn confirmation_timeout(&self) -> Option<Duration> {
        match self {
            Self::ProfitTarget(_) => None,
            Self::Bracket(spec) => Some(spec.confirmation_timeout),
            Self::ConfirmedStop(spec) => Some(spec.confirmation_timeout),
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ProfitTarget(_) => "profit_target",
            Self::Bracket(_) => "bracket",
            Self::ConfirmedStop(_) => "confirmed_stop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn profit_target_rejects_zero_timeout() {
        let offset = Offset::percent(dec!(2)).unwrap();
        assert!(matches!(
            ProfitTarget::new(offset, Duration::ZERO),
            Err(ValidationError::NonPositiveTimeout { .. })
        ));
        assert!(ProfitTarget::new(offset, Duration::from_secs(15)).is_ok());
    }

    #[test]
    fn bracket_rejects_zero_confirmation_timeout() {
        let one = Offset::dollar(dec!(1)).unwrap();
        let result = BracketSpec::new(one, Duration::ZERO, one, one, Duration::from_secs(15));
        assert!(matches!(
            result,
            Err(ValidationError::NonPositiveTimeout { ref field }) if field == "confirmation_timeout"
        ));
    }

    #[test]
    fn exit_spec_fill_timeout_and_label() {
        let one = Offset::dollar(dec!(1)).unwrap();
        let spec = ExitSpec::ConfirmedStop(
            ConfirmedStopSpec::new(one, Duration::from_secs(300), one, Duration::from_secs(20))
                .unwrap(),
        );
        assert_eq!(spec.fill_timeout(), Duration::from_secs(20));
        assert_eq!(spec.confirmation_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(spec.label(), "confirmed_stop");
    }
}
