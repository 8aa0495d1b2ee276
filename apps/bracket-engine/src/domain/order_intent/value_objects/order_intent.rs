//! The validated order intent.

use rust_decimal::Decimal;

use crate::domain::order_intent::errors::ValidationError;
use crate::domain::shared::{Quantity, Symbol};

use super::exit_spec::ExitSpec;
use super::order_kind::OrderKind;
use super::order_side::OrderSide;

/// A trader's complete instruction: the entry order plus what to do after it fills.
///
/// Immutable once built. Construction validates every field, so holding an
/// `OrderIntent` means it is safe to send to a broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    symbol: Symbol,
    side: OrderSide,
    quantity: Quantity,
    kind: OrderKind,
    exit: Option<ExitSpec>,
}

impl OrderIntent {
    /// Build a validated intent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` for a bad symbol and `InvalidLimitPrice` for a
    /// non-positive limit price.
    pub fn new(
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        kind: OrderKind,
        exit: Option<ExitSpec>,
    ) -> Result<Self, ValidationError> {
        symbol.validate()?;
        if let OrderKind::Limit { limit_price } = kind
            && limit_price <= Decimal::ZERO
        {
            return Err(ValidationError::InvalidLimitPrice { price: limit_price });
        }
        Ok(Self {
            symbol,
            side,
            quantity,
            kind,
            exit,
        })
    }

    /// Instrument.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Entry side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Share count.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Entry pricing.
    #[must_use]
    pub const fn kind(&self) -> OrderKind {
        self.kind
    }

    /// Exit behaviour, if the entry should be monitored.
    #[must_use]
    pub const fn exit(&self) -> Option<&ExitSpec> {
        self.exit.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_intent::value_objects::{Offset, ProfitTarget};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn market_intent_without_exit() {
        let intent =
            OrderIntent::new(Symbol::new("msft"), OrderSide::Buy, qty(100), OrderKind::Market, None)
                .unwrap();
        assert_eq!(intent.symbol().as_str(), "MSFT");
        assert!(intent.exit().is_none());
    }

    #[test]
    fn limit_price_must_be_positive() {
        let result = OrderIntent::new(
            Symbol::new("AAPL"),
            OrderSide::Sell,
            qty(10),
            OrderKind::Limit {
                limit_price: Decimal::ZERO,
            },
            None,
        );
        assert!(matches!(result, Err(ValidationError::InvalidLimitPrice { .. })));
    }

    #[test]
    fn bad_symbol_is_rejected() {
        let result =
            OrderIntent::new(Symbol::new("   "), OrderSide::Buy, qty(1), OrderKind::Market, None);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidField { ref field, .. }) if field == "symbol"
        ));
    }

    #[test]
    fn intent_keeps_exit_spec() {
        let exit = ExitSpec::ProfitTarget(
            ProfitTarget::new(Offset::percent(dec!(2)).unwrap(), Duration::from_secs(15)).unwrap(),
        );
        let intent = OrderIntent::new(
            Symbol::new("MSFT"),
            OrderSide::Buy,
            qty(100),
            OrderKind::Market,
            Some(exit),
        )
        .unwrap();
        assert_eq!(intent.exit(), Some(&exit));
    }
}
