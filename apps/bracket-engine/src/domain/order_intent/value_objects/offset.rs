//! Price offsets (absolute or percentage).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::order_intent::errors::ValidationError;

/// How an offset value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OffsetKind {
    /// Absolute dollar amount.
    Dollar,
    /// Percentage of the reference price.
    Percent,
}

impl FromStr for OffsetKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dollar" | "usd" | "$" => Ok(Self::Dollar),
            "percent" | "pct" | "%" => Ok(Self::Percent),
            other => Err(ValidationError::UnknownValue {
                field: "offset_type".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// A strictly positive adjustment from a reference price.
///
/// The sign is applied later by the price calculator from the leg direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Offset {
    kind: OffsetKind,
    value: Decimal,
}

impl Offset {
    /// Create a validated offset.
    ///
    /// `field` names the offset in error messages.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveOffset` when `value <= 0`. Percent offsets above
    /// 100 are accepted; whether the derived price stays positive depends on
    /// the leg direction and is checked when the price is computed.
    pub fn new(kind: OffsetKind, value: Decimal, field: &str) -> Result<Self, ValidationError> {
        if value <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveOffset {
                field: field.to_string(),
                value,
            });
        }
        Ok(Self { kind, value })
    }

    /// Dollar offset.
    ///
    /// # Errors
    ///
    /// See [`Offset::new`].
    pub fn dollar(value: Decimal) -> Result<Self, ValidationError> {
        Self::new(OffsetKind::Dollar, value, "dollar")
    }

    /// Percent offset.
    ///
    /// # Errors
    ///
    /// See [`Offset::new`].
    pub fn percent(value: Decimal) -> Result<Self, ValidationError> {
        Self::new(OffsetKind::Percent, value, "percent")
    }

    /// Offset kind.
    #[must_use]
    pub const fn kind(&self) -> OffsetKind {
        self.kind
    }

    /// Offset magnitude (always positive).
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.value
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OffsetKind::Dollar => write!(f, "${}", self.value),
            OffsetKind::Percent => write!(f, "{}%", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn offset_rejects_zero_and_negative() {
        assert!(matches!(
            Offset::dollar(Decimal::ZERO),
            Err(ValidationError::NonPositiveOffset { .. })
        ));
        assert!(Offset::percent(dec!(-1)).is_err());
    }

    #[test]
    fn percent_offset_above_hundred_is_accepted() {
        let offset = Offset::percent(dec!(150)).unwrap();
        assert_eq!(offset.kind(), OffsetKind::Percent);
        assert_eq!(offset.value(), dec!(150));
        assert!(Offset::percent(dec!(100)).is_ok());
        assert!(Offset::dollar(dec!(150)).is_ok());
    }

    #[test]
    fn offset_kind_parse() {
        assert_eq!("dollar".parse::<OffsetKind>().unwrap(), OffsetKind::Dollar);
        assert_eq!("PERCENT".parse::<OffsetKind>().unwrap(), OffsetKind::Percent);
        assert_eq!("%".parse::<OffsetKind>().unwrap(), OffsetKind::Percent);
        assert!("ticks".parse::<OffsetKind>().is_err());
    }

    #[test]
    fn offset_display() {
        assert_eq!(Offset::dollar(dec!(0.5)).unwrap().to_string(), "$0.5");
        assert_eq!(Offset::percent(dec!(2)).unwrap().to_string(), "2%");
    }
}
