//! Confirmation progress and realised P&L.

use rust_decimal::Decimal;

use crate::domain::order_intent::OrderSide;

/// Has `current` reached or passed `trigger` in the favorable direction?
#[must_use]
pub fn is_confirmed(side: OrderSide, trigger: Decimal, current: Decimal) -> bool {
    match side {
        OrderSide::Buy => current >= trigger,
        OrderSide::Sell => current <= trigger,
    }
}

/// Percentage of the way from the fill price to the confirmation trigger.
///
/// Clamped to `[0, 100]`. A trigger equal to the fill counts as fully confirmed.
#[must_use]
pub fn confirmation_progress(
    side: OrderSide,
    fill: Decimal,
    trigger: Decimal,
    current: Decimal,
) -> Decimal {
    let (moved, needed) = match side {
        OrderSide::Buy => (current - fill, trigger - fill),
        OrderSide::Sell => (fill - current, fill - trigger),
    };
    if needed <= Decimal::ZERO {
        return Decimal::ONE_HUNDRED;
    }
    (moved / needed * Decimal::ONE_HUNDRED).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

/// Realised profit per share when a position opened at `entry` exits at `exit`.
#[must_use]
pub fn per_share_pnl(side: OrderSide, entry: Decimal, exit: Decimal) -> Decimal {
    match side {
        OrderSide::Buy => exit - entry,
        OrderSide::Sell => entry - exit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn buy_progress_halfway() {
        assert_eq!(
            confirmation_progress(OrderSide::Buy, dec!(100), dec!(110), dec!(105)),
            dec!(50)
        );
    }

    #[test]
    fn sell_progress() {
        assert_eq!(
            confirmation_progress(OrderSide::Sell, dec!(100), dec!(98), dec!(99.5)),
            dec!(25)
        );
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(
            confirmation_progress(OrderSide::Buy, dec!(100), dec!(110), dec!(95)),
            Decimal::ZERO
        );
        assert_eq!(
            confirmation_progress(OrderSide::Buy, dec!(100), dec!(110), dec!(130)),
            Decimal::ONE_HUNDRED
        );
    }

    #[test]
    fn degenerate_trigger_is_complete() {
        assert_eq!(
            confirmation_progress(OrderSide::Buy, dec!(100), dec!(100), dec!(99)),
            Decimal::ONE_HUNDRED
        );
    }

    #[test]
    fn confirmation_check() {
        assert!(is_confirmed(OrderSide::Buy, dec!(101), dec!(101)));
        assert!(!is_confirmed(OrderSide::Buy, dec!(101), dec!(100.99)));
        assert!(is_confirmed(OrderSide::Sell, dec!(99), dec!(98.5)));
        assert!(!is_confirmed(OrderSide::Sell, dec!(99), dec!(99.01)));
    }

    #[test]
    fn pnl_sign_follows_side() {
        assert_eq!(per_share_pnl(OrderSide::Buy, dec!(100), dec!(103)), dec!(3));
        assert_eq!(per_share_pnl(OrderSide::Sell, dec!(100), dec!(103)), dec!(-3));
    }

    proptest! {
        /// Progress never decreases as price moves favorably, and stays in range.
        #[test]
        fn buy_progress_monotonic(
            a in 9_000i64..12_000,
            b in 9_000i64..12_000,
            span in 1i64..2_000,
        ) {
            let fill = dec!(100);
            let trigger = fill + Decimal::new(span, 2);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let p_lo = confirmation_progress(OrderSide::Buy, fill, trigger, Decimal::new(lo, 2));
            let p_hi = confirmation_progress(OrderSide::Buy, fill, trigger, Decimal::new(hi, 2));
            prop_assert!(p_lo <= p_hi);
            prop_assert!(p_lo >= Decimal::ZERO && p_hi <= Decimal::ONE_HUNDRED);
        }

        #[test]
        fn sell_progress_monotonic(
            a in 9_000i64..12_000,
            b in 9_000i64..12_000,
            span in 1i64..2_000,
        ) {
            let fill = dec!(100);
            let trigger = fill - Decimal::new(span, 2);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            // Lower prices are favorable for a short.
            let p_hi_price = confirmation_progress(OrderSide::Sell, fill, trigger, Decimal::new(hi, 2));
            let p_lo_price = confirmation_progress(OrderSide::Sell, fill, trigger, Decimal::new(lo, 2));
            prop_assert!(p_hi_price <= p_lo_price);
        }
    }
}
