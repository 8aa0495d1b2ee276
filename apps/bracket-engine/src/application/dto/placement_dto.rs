//! Placement DTOs
//!
//! The loosely typed payload a UI or script submits. It is parsed exactly
//! once into an [`OrderIntent`]; nothing downstream sees raw strings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::Quote;
use crate::config::DefaultsConfig;
use crate::domain::order_intent::{
    BracketSpec, ConfirmedStopSpec, ExitSpec, Offset, OffsetKind, OrderIntent, OrderKind,
    OrderSide, ProfitTarget, ValidationError,
};
use crate::domain::shared::{Quantity, Symbol};

/// Where a limit entry's price comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitPriceSource {
    /// Use the submitted `limit_price`.
    #[default]
    Manual,
    /// Use the live best bid.
    Bid,
    /// Use the live best ask.
    Ask,
}

impl FromStr for LimitPriceSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" | "" => Ok(Self::Manual),
            "bid" => Ok(Self::Bid),
            "ask" => Ok(Self::Ask),
            other => Err(ValidationError::UnknownValue {
                field: "limit_price_source".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LimitPriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Bid => write!(f, "bid"),
            Self::Ask => write!(f, "ask"),
        }
    }
}

/// Exit instructions as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ExitRequestDto {
    /// Profit target placed on fill.
    ProfitTarget {
        /// "dollar" or "percent" (default dollar).
        #[serde(default)]
        offset_type: Option<String>,
        /// Offset magnitude.
        #[serde(default)]
        offset: Option<Decimal>,
        /// Entry fill timeout.
        #[serde(default)]
        fill_timeout_secs: Option<u64>,
    },
    /// Confirmation-gated stop and target.
    Bracket {
        /// Confirmation offset kind.
        #[serde(default)]
        confirmation_type: Option<String>,
        /// Confirmation offset.
        #[serde(default)]
        confirmation_offset: Option<Decimal>,
        /// Stop-loss offset kind.
        #[serde(default)]
        stop_loss_type: Option<String>,
        /// Stop-loss offset.
        #[serde(default)]
        stop_loss_offset: Option<Decimal>,
        /// Profit offset kind.
        #[serde(default)]
        profit_type: Option<String>,
        /// Profit offset.
        #[serde(default)]
        profit_offset: Option<Decimal>,
        /// Entry fill timeout.
        #[serde(default)]
        fill_timeout_secs: Option<u64>,
        /// Confirmation timeout.
        #[serde(default)]
        confirmation_timeout_secs: Option<u64>,
    },
    /// Confirmation-gated single stop.
    ConfirmedStop {
        /// Confirmation offset kind.
        #[serde(default)]
        confirmation_type: Option<String>,
        /// Confirmation offset.
        #[serde(default)]
        confirmation_offset: Option<Decimal>,
        /// Stop offset kind.
        #[serde(default)]
        stop_type: Option<String>,
        /// Stop offset.
        #[serde(default)]
        stop_offset: Option<Decimal>,
        /// Entry fill timeout.
        #[serde(default)]
        fill_timeout_secs: Option<u64>,
        /// Confirmation timeout.
        #[serde(default)]
        confirmation_timeout_secs: Option<u64>,
    },
}

/// Placement request as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequestDto {
    /// Ticker.
    #[serde(default)]
    pub symbol: Option<String>,
    /// BUY / SELL (broker aliases accepted).
    #[serde(default)]
    pub side: Option<String>,
    /// Whole shares.
    #[serde(default)]
    pub quantity: Option<u32>,
    /// MARKET or LIMIT (default MARKET).
    #[serde(default, alias = "priceType")]
    pub price_type: Option<String>,
    /// Limit price for a manual LIMIT entry.
    #[serde(default, alias = "limitPrice")]
    pub limit_price: Option<Decimal>,
    /// manual / bid / ask (default manual).
    #[serde(default, alias = "limitPriceSource")]
    pub limit_price_source: Option<String>,
    /// Optional exit.
    #[serde(default)]
    pub exit: Option<ExitRequestDto>,
}

impl PlaceOrderRequestDto {
    /// Whether this request is a LIMIT entry priced from a live quote.
    ///
    /// # Errors
    ///
    /// Returns `UnknownValue` for an unrecognized price type or source.
    pub fn needs_quote(&self) -> Result<bool, ValidationError> {
        Ok(self.is_limit()? && self.limit_source()? != LimitPriceSource::Manual)
    }

    /// Ticker as submitted, if any.
    #[must_use]
    pub fn symbol(&self) -> Option<Symbol> {
        self.symbol.as_deref().map(Symbol::new)
    }

    /// Validate the payload into an intent.
    ///
    /// `quote` must be supplied when [`Self::needs_quote`] is true.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for missing fields, unknown strings or
    /// out-of-range values.
    pub fn into_intent(
        &self,
        defaults: &DefaultsConfig,
        quote: Option<&Quote>,
    ) -> Result<OrderIntent, ValidationError> {
        let symbol = Symbol::new(required(self.symbol.clone(), "symbol")?);
        let side: OrderSide = required(self.side.as_deref(), "side")?.parse()?;
        let quantity = Quantity::new(required(self.quantity, "quantity")?)?;
        let kind = self.order_kind(quote)?;
        let exit = self
            .exit
            .as_ref()
            .map(|exit| exit.to_spec(defaults))
            .transpose()?;
        OrderIntent::new(symbol, side, quantity, kind, exit)
    }

    fn is_limit(&self) -> Result<bool, ValidationError> {
        match self
            .price_type
            .as_deref()
            .map(|s| s.trim().to_uppercase())
            .as_deref()
        {
            None | Some("MARKET") => Ok(false),
            Some("LIMIT") => Ok(true),
            Some(other) => Err(ValidationError::UnknownValue {
                field: "price_type".to_string(),
                value: other.to_string(),
            }),
        }
    }

    fn limit_source(&self) -> Result<LimitPriceSource, ValidationError> {
        self.limit_price_source
            .as_deref()
            .map_or(Ok(LimitPriceSource::Manual), str::parse)
    }

    fn order_kind(&self, quote: Option<&Quote>) -> Result<OrderKind, ValidationError> {
        if !self.is_limit()? {
            return Ok(OrderKind::Market);
        }
        let limit_price = match self.limit_source()? {
            LimitPriceSource::Manual => required(self.limit_price, "limit_price")?,
            LimitPriceSource::Bid => required(quote, "quote")?.bid,
            LimitPriceSource::Ask => required(quote, "quote")?.ask,
        };
        Ok(OrderKind::Limit { limit_price })
    }
}

impl ExitRequestDto {
    /// Validate into an exit specification, filling absent timeouts from `defaults`.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for missing offsets, unknown offset kinds,
    /// non-positive offsets or zero timeouts.
    pub fn to_spec(&self, defaults: &DefaultsConfig) -> Result<ExitSpec, ValidationError> {
        let fill = |secs: Option<u64>| secs.map_or(defaults.fill_timeout(), Duration::from_secs);
        let confirm =
            |secs: Option<u64>| secs.map_or(defaults.confirmation_timeout(), Duration::from_secs);

        match self {
            Self::ProfitTarget {
                offset_type,
                offset,
                fill_timeout_secs,
            } => Ok(ExitSpec::ProfitTarget(ProfitTarget::new(
                parse_offset(offset_type.as_deref(), *offset, "profit")?,
                fill(*fill_timeout_secs),
            )?)),
            Self::Bracket {
                confirmation_type,
                confirmation_offset,
                stop_loss_type,
                stop_loss_offset,
                profit_type,
                profit_offset,
                fill_timeout_secs,
                confirmation_timeout_secs,
            } => Ok(ExitSpec::Bracket(BracketSpec::new(
                parse_offset(confirmation_type.as_deref(), *confirmation_offset, "confirmation")?,
                confirm(*confirmation_timeout_secs),
                parse_offset(stop_loss_type.as_deref(), *stop_loss_offset, "stop_loss")?,
                parse_offset(profit_type.as_deref(), *profit_offset, "profit")?,
                fill(*fill_timeout_secs),
            )?)),
            Self::ConfirmedStop {
                confirmation_type,
                confirmation_offset,
                stop_type,
                stop_offset,
                fill_timeout_secs,
                confirmation_timeout_secs,
            } => Ok(ExitSpec::ConfirmedStop(ConfirmedStopSpec::new(
                parse_offset(confirmation_type.as_deref(), *confirmation_offset, "confirmation")?,
                confirm(*confirmation_timeout_secs),
                parse_offset(stop_type.as_deref(), *stop_offset, "stop")?,
                fill(*fill_timeout_secs),
            )?)),
        }
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField {
        field: field.to_string(),
    })
}

/// Offset kinds default to dollar when omitted.
fn parse_offset(
    kind: Option<&str>,
    value: Option<Decimal>,
    field: &str,
) -> Result<Offset, ValidationError> {
    let kind = match kind {
        None => OffsetKind::Dollar,
        Some(raw) => raw
            .parse::<OffsetKind>()
            .map_err(|_| ValidationError::UnknownValue {
                field: format!("{field}_type"),
                value: raw.to_string(),
            })?,
    };
    let value = required(value, &format!("{field}_offset"))?;
    Offset::new(kind, value, field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base() -> PlaceOrderRequestDto {
        PlaceOrderRequestDto {
            symbol: Some("msft".to_string()),
            side: Some("BUY".to_string()),
            quantity: Some(100),
            ..Default::default()
        }
    }

    #[test]
    fn market_profit_target_from_json() {
        let json = r#"{
            "symbol": "MSFT",
            "side": "buy",
            "quantity": 100,
            "exit": {"strategy": "profit_target", "offset_type": "percent", "offset": "2"}
        }"#;
        let dto: PlaceOrderRequestDto = serde_json::from_str(json).unwrap();
        let intent = dto.into_intent(&DefaultsConfig::default(), None).unwrap();

        assert_eq!(intent.symbol().as_str(), "MSFT");
        assert_eq!(intent.kind(), OrderKind::Market);
        let Some(ExitSpec::ProfitTarget(spec)) = intent.exit().copied() else {
            panic!("expected profit target");
        };
        assert_eq!(spec.offset, Offset::percent(dec!(2)).unwrap());
        assert_eq!(spec.fill_timeout, Duration::from_secs(15));
    }

    #[test]
    fn camel_case_aliases_are_accepted() {
        let json = r#"{"symbol": "AAPL", "side": "SELL_SHORT", "quantity": 5,
                       "priceType": "LIMIT", "limitPrice": "190.25"}"#;
        let dto: PlaceOrderRequestDto = serde_json::from_str(json).unwrap();
        let intent = dto.into_intent(&DefaultsConfig::default(), None).unwrap();
        assert_eq!(intent.side(), OrderSide::Sell);
        assert_eq!(
            intent.kind(),
            OrderKind::Limit {
                limit_price: dec!(190.25)
            }
        );
    }

    #[test]
    fn bracket_uses_default_timeouts() {
        let mut dto = base();
        dto.exit = Some(ExitRequestDto::Bracket {
            confirmation_type: Some("percent".into()),
            confirmation_offset: Some(dec!(1)),
            stop_loss_type: None,
            stop_loss_offset: Some(dec!(3)),
            profit_type: Some("dollar".into()),
            profit_offset: Some(dec!(3)),
            fill_timeout_secs: Some(20),
            confirmation_timeout_secs: None,
        });
        let intent = dto.into_intent(&DefaultsConfig::default(), None).unwrap();
        let exit = intent.exit().copied().unwrap();
        assert_eq!(exit.fill_timeout(), Duration::from_secs(20));
        assert_eq!(exit.confirmation_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn bid_source_takes_price_from_quote() {
        let mut dto = base();
        dto.price_type = Some("limit".into());
        dto.limit_price_source = Some("bid".into());
        assert!(dto.needs_quote().unwrap());

        assert!(matches!(
            dto.into_intent(&DefaultsConfig::default(), None),
            Err(ValidationError::MissingField { ref field }) if field == "quote"
        ));

        let quote = Quote {
            bid: dec!(99.95),
            ask: dec!(100.05),
            last: dec!(100),
        };
        let intent = dto
            .into_intent(&DefaultsConfig::default(), Some(&quote))
            .unwrap();
        assert_eq!(intent.kind().limit_price(), Some(dec!(99.95)));
    }

    #[test]
    fn market_entry_ignores_limit_source() {
        let mut dto = base();
        dto.limit_price_source = Some("ask".into());
        assert!(!dto.needs_quote().unwrap());
    }

    #[test]
    fn missing_and_unknown_fields_are_rejected() {
        let mut dto = base();
        dto.quantity = None;
        assert!(matches!(
            dto.into_intent(&DefaultsConfig::default(), None),
            Err(ValidationError::MissingField { ref field }) if field == "quantity"
        ));

        let mut dto = base();
        dto.price_type = Some("STOP".into());
        assert!(matches!(
            dto.into_intent(&DefaultsConfig::default(), None),
            Err(ValidationError::UnknownValue { ref field, .. }) if field == "price_type"
        ));

        let mut dto = base();
        dto.exit = Some(ExitRequestDto::ProfitTarget {
            offset_type: Some("ticks".into()),
            offset: Some(dec!(1)),
            fill_timeout_secs: None,
        });
        assert!(matches!(
            dto.into_intent(&DefaultsConfig::default(), None),
            Err(ValidationError::UnknownValue { ref field, .. }) if field == "profit_type"
        ));
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let mut dto = base();
        dto.exit = Some(ExitRequestDto::ProfitTarget {
            offset_type: None,
            offset: Some(Decimal::ZERO),
            fill_timeout_secs: None,
        });
        assert!(matches!(
            dto.into_intent(&DefaultsConfig::default(), None),
            Err(ValidationError::NonPositiveOffset { .. })
        ));

        let mut dto = base();
        dto.quantity = Some(0);
        assert!(matches!(
            dto.into_intent(&DefaultsConfig::default(), None),
            Err(ValidationError::InvalidField { ref field, .. }) if field == "quantity"
        ));

        let mut dto = base();
        dto.exit = Some(ExitRequestDto::ConfirmedStop {
            confirmation_type: None,
            confirmation_offset: Some(dec!(1)),
            stop_type: None,
            stop_offset: Some(dec!(1)),
            fill_timeout_secs: Some(0),
            confirmation_timeout_secs: None,
        });
        assert!(matches!(
            dto.into_intent(&DefaultsConfig::default(), None),
            Err(ValidationError::NonPositiveTimeout { .. })
        ));
    }
}
