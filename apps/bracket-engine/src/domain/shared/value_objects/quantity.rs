//! Quantity value object for order quantities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// A whole-share order quantity.
///
/// Always strictly positive once constructed through [`Quantity::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Maximum shares accepted in a single order.
    pub const MAX: u32 = 100_000;

    /// Create a validated quantity.
    ///
    /// # Errors
    ///
    /// Returns error if the quantity is zero or exceeds [`Quantity::MAX`].
    pub fn new(shares: u32) -> Result<Self, DomainError> {
        if shares == 0 {
            return Err(DomainError::InvalidValue {
                field: "quantity".to_string(),
                message: "Order quantity must be positive".to_string(),
            });
        }
        if shares > Self::MAX {
            return Err(DomainError::InvalidValue {
                field: "quantity".to_string(),
                message: format!("Order quantity exceeds maximum: {}", Self::MAX),
            });
        }
        Ok(Self(shares))
    }

    /// Number of shares.
    #[must_use]
    pub const fn shares(&self) -> u32 {
        self.0
    }

    /// Quantity as a Decimal for price arithmetic.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
