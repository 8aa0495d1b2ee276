//! Monitoring configuration: poll cadence and exit-leg policy.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::PriceSource;
use crate::domain::monitoring::ExitLeg;

/// Which leg wins when both bracket legs show filled in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegPriority {
    /// Assume the stop filled first (pessimistic).
    #[default]
    StopFirst,
    /// Assume the target filled first.
    TargetFirst,
}

impl LegPriority {
    /// The leg that wins a tie.
    #[must_use]
    pub const fn winner(&self) -> ExitLeg {
        match self {
            Self::StopFirst => ExitLeg::Stop,
            Self::TargetFirst => ExitLeg::Profit,
        }
    }
}

/// Monitoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Poll interval while racing the entry fill against its timeout.
    #[serde(default = "default_fill_poll_interval")]
    pub fill_poll_interval_ms: u64,
    /// Poll interval while awaiting price confirmation.
    #[serde(default = "default_confirmation_poll_interval")]
    pub confirmation_poll_interval_ms: u64,
    /// Poll interval while exit legs are live.
    #[serde(default = "default_bracket_poll_interval")]
    pub bracket_poll_interval_ms: u64,
    /// Lowest accepted poll interval.
    #[serde(default = "default_min_poll_interval")]
    pub min_poll_interval_ms: u64,
    /// Highest accepted poll interval.
    #[serde(default = "default_max_poll_interval")]
    pub max_poll_interval_ms: u64,
    /// Tie-break when both legs fill in one tick.
    #[serde(default)]
    pub leg_priority: LegPriority,
    /// Cancel the surviving leg once one leg fills.
    #[serde(default = "default_cancel_sibling_on_fill")]
    pub cancel_sibling_on_fill: bool,
    /// Quote field compared against the confirmation trigger.
    #[serde(default)]
    pub confirmation_price_source: PriceSource,
    /// Distance between a stop trigger and its limit price.
    #[serde(default = "default_stop_limit_slippage")]
    pub stop_limit_slippage: Decimal,
    /// Capacity of the status event broadcast channel.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            fill_poll_interval_ms: default_fill_poll_interval(),
            confirmation_poll_interval_ms: default_confirmation_poll_interval(),
            bracket_poll_interval_ms: default_bracket_poll_interval(),
            min_poll_interval_ms: default_min_poll_interval(),
            max_poll_interval_ms: default_max_poll_interval(),
            leg_priority: LegPriority::default(),
            cancel_sibling_on_fill: default_cancel_sibling_on_fill(),
            confirmation_price_source: PriceSource::default(),
            stop_limit_slippage: default_stop_limit_slippage(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl MonitoringConfig {
    /// Fill/timeout race cadence.
    #[must_use]
    pub const fn fill_poll_interval(&self) -> Duration {
        Duration::from_millis(self.fill_poll_interval_ms)
    }

    /// Confirmation cadence.
    #[must_use]
    pub const fn confirmation_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_interval_ms)
    }

    /// Exit-leg cadence.
    #[must_use]
    pub const fn bracket_poll_interval(&self) -> Duration {
        Duration::from_millis(self.bracket_poll_interval_ms)
    }

    /// Check intervals against the configured bounds.
    ///
    /// # Errors
    ///
    /// Returns a description of the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_poll_interval_ms == 0 || self.min_poll_interval_ms > self.max_poll_interval_ms {
            return Err(format!(
                "monitoring.min_poll_interval_ms ({}) must be positive and <= max_poll_interval_ms ({})",
                self.min_poll_interval_ms, self.max_poll_interval_ms
            ));
        }
        for (name, value) in [
            ("fill_poll_interval_ms", self.fill_poll_interval_ms),
            ("confirmation_poll_interval_ms", self.confirmation_poll_interval_ms),
            ("bracket_poll_interval_ms", self.bracket_poll_interval_ms),
        ] {
            if !(self.min_poll_interval_ms..=self.max_poll_interval_ms).contains(&value) {
                return Err(format!(
                    "monitoring.{name} must be between {} and {} ms, got {value}",
                    self.min_poll_interval_ms, self.max_poll_interval_ms
                ));
            }
        }
        if self.stop_limit_slippage < Decimal::ZERO {
            return Err("monitoring.stop_limit_slippage must not be negative".to_string());
        }
        if self.event_channel_capacity == 0 {
            return Err("monitoring.event_channel_capacity must be positive".to_string());
        }
        Ok(())
    }
}

const fn default_fill_poll_interval() -> u64 {
    500
}

const fn default_confirmation_poll_interval() -> u64 {
    1_000
}

const fn default_bracket_poll_interval() -> u64 {
    2_000
}

const fn default_min_poll_interval() -> u64 {
    100
}

const fn default_max_poll_interval() -> u64 {
    10_000
}

const fn default_cancel_sibling_on_fill() -> bool {
    true
}

const fn default_stop_limit_slippage() -> Decimal {
    dec!(0.01)
}

const fn default_event_channel_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitoring_defaults() {
        let config = MonitoringConfig::default();
        assert_eq!(config.fill_poll_interval(), Duration::from_millis(500));
        assert_eq!(config.confirmation_poll_interval(), Duration::from_secs(1));
        assert_eq!(config.bracket_poll_interval(), Duration::from_secs(2));
        assert_eq!(config.leg_priority, LegPriority::StopFirst);
        assert!(config.cancel_sibling_on_fill);
        assert_eq!(config.confirmation_price_source, PriceSource::Last);
        assert_eq!(config.stop_limit_slippage, dec!(0.01));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn interval_out_of_bounds() {
        let config = MonitoringConfig {
            fill_poll_interval_ms: 50,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("fill_poll_interval_ms"));

        let config = MonitoringConfig {
            bracket_poll_interval_ms: 60_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn leg_priority_winner() {
        assert_eq!(LegPriority::StopFirst.winner(), ExitLeg::Stop);
        assert_eq!(LegPriority::TargetFirst.winner(), ExitLeg::Profit);
    }
}
