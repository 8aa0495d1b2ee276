//! Simulated broker configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Paper broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperBrokerConfig {
    /// RNG seed; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Starting last price per symbol.
    #[serde(default)]
    pub initial_prices: HashMap<String, Decimal>,
    /// Starting price for symbols not listed above.
    #[serde(default = "default_price")]
    pub default_price: Decimal,
    /// Maximum move per price step, in basis points.
    #[serde(default = "default_volatility_bps")]
    pub volatility_bps: u32,
    /// Half the bid/ask spread, in cents.
    #[serde(default = "default_half_spread_cents")]
    pub half_spread_cents: u32,
    /// Market orders fill after this many milliseconds.
    #[serde(default = "default_market_fill_delay")]
    pub market_fill_delay_ms: u64,
    /// Time between simulated price steps.
    #[serde(default = "default_step_interval")]
    pub step_interval_ms: u64,
}

impl Default for PaperBrokerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            initial_prices: HashMap::new(),
            default_price: default_price(),
            volatility_bps: default_volatility_bps(),
            half_spread_cents: default_half_spread_cents(),
            market_fill_delay_ms: default_market_fill_delay(),
            step_interval_ms: default_step_interval(),
        }
    }
}

impl PaperBrokerConfig {
    /// Starting price for a symbol.
    #[must_use]
    pub fn initial_price(&self, symbol: &str) -> Decimal {
        self.initial_prices
            .get(symbol)
            .copied()
            .unwrap_or(self.default_price)
    }
}

const fn default_price() -> Decimal {
    Decimal::ONE_HUNDRED
}

const fn default_volatility_bps() -> u32 {
    10
}

const fn default_half_spread_cents() -> u32 {
    1
}

const fn default_market_fill_delay() -> u64 {
    1_500
}

const fn default_step_interval() -> u64 {
    250
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn initial_price_falls_back_to_default() {
        let mut config = PaperBrokerConfig::default();
        config.initial_prices.insert("MSFT".to_string(), dec!(410.5));
        assert_eq!(config.initial_price("MSFT"), dec!(410.5));
        assert_eq!(config.initial_price("AAPL"), dec!(100));
    }
}
