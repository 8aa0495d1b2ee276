//! Entry order kind.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the entry order is priced.
///
/// The limit price lives inside the `Limit` variant, so it is present
/// exactly when the order is a limit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    /// Market order.
    Market,
    /// Limit order.
    Limit {
        /// Limit price.
        limit_price: Decimal,
    },
}

impl OrderKind {
    /// Limit price, if any.
    #[must_use]
    pub const fn limit_price(&self) -> Option<Decimal> {
        match self {
            Self::Market => None,
            Self::Limit { limit_price } => Some(*limit_price),
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit { limit_price } => write!(f, "LIMIT @ {limit_price}"),
        }
    }
}
