//! Offset price arithmetic.
//!
//! Offsets are always positive; the leg direction supplies the sign.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::order_intent::{Offset, OffsetKind, OrderSide};

/// Which way a derived price moves from its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceDirection {
    /// Above the base.
    Up,
    /// Below the base.
    Down,
}

impl PriceDirection {
    /// `+1` for up, `-1` for down.
    #[must_use]
    pub const fn sign(&self) -> Decimal {
        match self {
            Self::Up => Decimal::ONE,
            Self::Down => Decimal::NEGATIVE_ONE,
        }
    }

    /// The reverse direction.
    #[must_use]
    pub const fn reverse(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// Role of a derived price within a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    /// Confirmation trigger (not an order).
    Confirmation,
    /// Profit-taking exit.
    ProfitTarget,
    /// Protective stop exit.
    StopLoss,
}

/// Resolve the price direction for a leg given the entry side.
///
/// Confirmation and profit move with the position; the stop moves against it.
#[must_use]
pub const fn leg_direction(side: OrderSide, leg: LegKind) -> PriceDirection {
    match (side, leg) {
        (OrderSide::Buy, LegKind::Confirmation | LegKind::ProfitTarget)
        | (OrderSide::Sell, LegKind::StopLoss) => PriceDirection::Up,
        (OrderSide::Sell, LegKind::Confirmation | LegKind::ProfitTarget)
        | (OrderSide::Buy, LegKind::StopLoss) => PriceDirection::Down,
    }
}

/// Apply an offset to a base price.
///
/// - Dollar: `base ± value`
/// - Percent: `base × (1 ± value / 100)`
///
/// No rounding is applied; see [`round_to_cent`].
#[must_use]
pub fn compute_offset_price(base: Decimal, offset: Offset, direction: PriceDirection) -> Decimal {
    let sign = direction.sign();
    match offset.kind() {
        OffsetKind::Dollar => base + sign * offset.value(),
        OffsetKind::Percent => base * (Decimal::ONE + sign * offset.value() / Decimal::ONE_HUNDRED),
    }
}

/// Round a price to whole cents, midpoint away from zero.
#[must_use]
pub fn round_to_cent(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price of a single leg for `side`, rounded to cents.
#[must_use]
pub fn leg_price(side: OrderSide, leg: LegKind, base: Decimal, offset: Offset) -> Decimal {
    round_to_cent(compute_offset_price(base, offset, leg_direction(side, leg)))
}
