//! Derived exit levels for confirmation-gated strategies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_intent::{BracketSpec, ConfirmedStopSpec, ExitSpec, Offset, OrderSide};
use crate::domain::shared::DomainError;

use super::offset_price::{LegKind, leg_direction, leg_price, round_to_cent};

/// All prices derived from an entry fill, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketLevels {
    /// Price that confirms the move and arms the exits.
    pub trigger: Decimal,
    /// Stop trigger for the protective leg.
    pub stop: Decimal,
    /// Limit price of the stop-limit leg, `slippage` beyond the stop.
    pub stop_limit: Decimal,
    /// Profit-target limit price; absent for a single confirmed stop.
    pub target: Option<Decimal>,
}

impl BracketLevels {
    /// Derive levels from offsets relative to the entry fill price.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if any derived price is not strictly positive
    /// (e.g. a dollar stop offset larger than the fill price).
    pub fn compute(
        side: OrderSide,
        fill: Decimal,
        confirmation: Offset,
        stop: Offset,
        profit: Option<Offset>,
        slippage: Decimal,
    ) -> Result<Self, DomainError> {
        let trigger = leg_price(side, LegKind::Confirmation, fill, confirmation);
        let stop_price = leg_price(side, LegKind::StopLoss, fill, stop);
        let stop_limit =
            round_to_cent(stop_price + leg_direction(side, LegKind::StopLoss).sign() * slippage);
        let target = profit.map(|offset| leg_price(side, LegKind::ProfitTarget, fill, offset));

        for (field, price) in [
            ("trigger_price", Some(trigger)),
            ("stop_price", Some(stop_price)),
            ("stop_limit_price", Some(stop_limit)),
            ("target_price", target),
        ] {
            if let Some(price) = price
                && price <= Decimal::ZERO
            {
                return Err(DomainError::InvalidValue {
                    field: field.to_string(),
                    message: format!("derived price {price} from fill {fill} is not positive"),
                });
            }
        }

        Ok(Self {
            trigger,
            stop: stop_price,
            stop_limit,
            target,
        })
    }

    /// Levels for a two-legged bracket.
    ///
    /// # Errors
    ///
    /// See [`BracketLevels::compute`].
    pub fn for_bracket(
        side: OrderSide,
        fill: Decimal,
        spec: &BracketSpec,
        slippage: Decimal,
    ) -> Result<Self, DomainError> {
        Self::compute(side, fill, spec.confirmation, spec.stop, Some(spec.profit), slippage)
    }

    /// Levels for a single confirmed stop.
    ///
    /// # Errors
    ///
    /// See [`BracketLevels::compute`].
    pub fn for_confirmed_stop(
        side: OrderSide,
        fill: Decimal,
        spec: &ConfirmedStopSpec,
        slippage: Decimal,
    ) -> Result<Self, DomainError> {
        Self::compute(side, fill, spec.confirmation, spec.stop, None, slippage)
    }

    /// Levels for any confirmation-gated exit spec; `None` for a plain profit target.
    ///
    /// # Errors
    ///
    /// See [`BracketLevels::compute`].
    pub fn for_exit(
        side: OrderSide,
        fill: Decimal,
        exit: &ExitSpec,
        slippage: Decimal,
    ) -> Result<Option<Self>, DomainError> {
        match exit {
            ExitSpec::ProfitTarget(_) => Ok(None),
            ExitSpec::Bracket(spec) => Self::for_bracket(side, fill, spec, slippage).map(Some),
            ExitSpec::ConfirmedStop(spec) => {
                Self::for_confirmed_stop(side, fill, spec, slippage).map(Some)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn spec(conf: Offset, stop: Offset, profit: Offset) -> BracketSpec {
        BracketSpec::new(
            conf,
            Duration::from_secs(300),
            stop,
            profit,
            Duration::from_secs(15),
        )
        .unwrap()
    }

    #[test]
    fn long_bracket_levels() {
        let spec = spec(
            Offset::percent(dec!(1)).unwrap(),
            Offset::dollar(dec!(3)).unwrap(),
            Offset::dollar(dec!(3)).unwrap(),
        );
        let levels = BracketLevels::for_bracket(OrderSide::Buy, dec!(100), &spec, dec!(0.01)).unwrap();
        assert_eq!(levels.trigger, dec!(101));
        assert_eq!(levels.stop, dec!(97));
        assert_eq!(levels.stop_limit, dec!(96.99));
        assert_eq!(levels.target, Some(dec!(103)));
    }

    #[test]
    fn short_bracket_levels_mirror() {
        let spec = spec(
            Offset::percent(dec!(1)).unwrap(),
            Offset::percent(dec!(2)).unwrap(),
            Offset::percent(dec!(4)).unwrap(),
        );
        let levels = BracketLevels::for_bracket(OrderSide::Sell, dec!(50), &spec, dec!(0.05)).unwrap();
        assert_eq!(levels.trigger, dec!(49.50));
        assert_eq!(levels.stop, dec!(51));
        assert_eq!(levels.stop_limit, dec!(51.05));
        assert_eq!(levels.target, Some(dec!(48)));
    }

    #[test]
    fn confirmed_stop_has_no_target() {
        let spec = ConfirmedStopSpec::new(
            Offset::dollar(dec!(0.5)).unwrap(),
            Duration::from_secs(60),
            Offset::dollar(dec!(1)).unwrap(),
            Duration::from_secs(15),
        )
        .unwrap();
        let exit = ExitSpec::ConfirmedStop(spec);
        let levels = BracketLevels::for_exit(OrderSide::Buy, dec!(20), &exit, dec!(0.01))
            .unwrap()
            .unwrap();
        assert_eq!(levels.target, None);
        assert_eq!(levels.stop, dec!(19));
    }

    #[test]
    fn oversized_dollar_stop_is_rejected() {
        let result = BracketLevels::compute(
            OrderSide::Buy,
            dec!(2),
            Offset::dollar(dec!(0.1)).unwrap(),
            Offset::dollar(dec!(5)).unwrap(),
            None,
            dec!(0.01),
        );
        assert!(matches!(
            result,
            Err(DomainError::InvalidValue { ref field, .. }) if field == "stop_price"
        ));
    }

    #[test]
    fn percent_offsets_above_hundred_depend_on_direction() {
        let result = BracketLevels::compute(
            OrderSide::Buy,
            dec!(100),
            Offset::percent(dec!(1)).unwrap(),
            Offset::percent(dec!(150)).unwrap(),
            Some(Offset::percent(dec!(150)).unwrap()),
            dec!(0.01),
        );
        assert!(matches!(
            result,
            Err(DomainError::InvalidValue { ref field, .. }) if field == "stop_price"
        ));

        let short = BracketLevels::compute(
            OrderSide::Sell,
            dec!(100),
            Offset::percent(dec!(1)).unwrap(),
            Offset::percent(dec!(150)).unwrap(),
            None,
            dec!(0.01),
        )
        .unwrap();
        assert_eq!(short.stop, dec!(250));
    }
}
