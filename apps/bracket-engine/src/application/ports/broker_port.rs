//! Broker Port (Driven Port)
//!
//! The four brokerage primitives the engine is built on: place, cancel,
//! fill status and quote.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::order_intent::{OrderKind, OrderSide};
use crate::domain::shared::{OrderId, Quantity, Symbol};

/// Broker order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Market order.
    Market,
    /// Limit order.
    Limit,
    /// Stop-limit order.
    StopLimit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit => write!(f, "LIMIT"),
            Self::StopLimit => write!(f, "STOP_LIMIT"),
        }
    }
}

/// Time in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Day order.
    #[default]
    Day,
    /// Good till canceled.
    Gtc,
}

/// Request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Quantity.
    pub quantity: Quantity,
    /// Order type.
    pub order_type: OrderType,
    /// Limit price (limit and stop-limit orders).
    pub limit_price: Option<Decimal>,
    /// Stop trigger (stop-limit orders).
    pub stop_price: Option<Decimal>,
    /// Time in force.
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    /// Create a market order request.
    #[must_use]
    pub const fn market(symbol: Symbol, side: OrderSide, quantity: Quantity) -> Self {
        Self {
            symbol,
            side,
            quantity,
            order_type: OrderType::Market,
            limit_price: None,
            stop_price: None,
            time_in_force: TimeInForce::Day,
        }
    }

    /// Create a limit order request.
    #[must_use]
    pub const fn limit(
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        limit_price: Decimal,
    ) -> Self {
        Self {
            symbol,
            side,
            quantity,
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
            stop_price: None,
            time_in_force: TimeInForce::Day,
        }
    }

    /// Create a stop-limit order request.
    #[must_use]
    pub const fn stop_limit(
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            symbol,
            side,
            quantity,
            order_type: OrderType::StopLimit,
            limit_price: Some(limit_price),
            stop_price: Some(stop_price),
            time_in_force: TimeInForce::Day,
        }
    }

    /// Entry order for an intent's pricing.
    #[must_use]
    pub const fn entry(symbol: Symbol, side: OrderSide, quantity: Quantity, kind: OrderKind) -> Self {
        match kind {
            OrderKind::Market => Self::market(symbol, side, quantity),
            OrderKind::Limit { limit_price } => Self::limit(symbol, side, quantity, limit_price),
        }
    }

    /// Set time in force.
    #[must_use]
    pub const fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }
}

/// Acknowledgment of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Broker-assigned order ID.
    pub order_id: OrderId,
}

/// Fill status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillStatus {
    /// Whether the order has fully filled.
    pub filled: bool,
    /// Average fill price, when filled.
    pub fill_price: Option<Decimal>,
}

impl FillStatus {
    /// Not filled yet.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            filled: false,
            fill_price: None,
        }
    }

    /// Filled at `price`.
    #[must_use]
    pub const fn filled(price: Decimal) -> Self {
        Self {
            filled: true,
            fill_price: Some(price),
        }
    }
}

/// Reply to a cancel request.
///
/// Canceling an order that already filled or was already canceled reports
/// `success = false` rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelAck {
    /// Whether the broker withdrew the order.
    pub success: bool,
}

/// Which side of the book to read a price from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Last trade.
    #[default]
    Last,
    /// Best bid.
    Bid,
    /// Best ask.
    Ask,
    /// Bid/ask midpoint.
    Mid,
}

/// Live quote for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Best bid.
    pub bid: Decimal,
    /// Best ask.
    pub ask: Decimal,
    /// Last trade.
    pub last: Decimal,
}

impl Quote {
    /// Read the price for a source.
    #[must_use]
    pub fn price(&self, source: PriceSource) -> Decimal {
        match source {
            PriceSource::Last => self.last,
            PriceSource::Bid => self.bid,
            PriceSource::Ask => self.ask,
            PriceSource::Mid => (self.bid + self.ask) / Decimal::TWO,
        }
    }
}

/// Broker port error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// Connection error.
    #[error("Broker connection error: {message}")]
    ConnectionError {
        /// Error details.
        message: String,
    },

    /// Rate limited.
    #[error("Rate limited by broker")]
    RateLimited,

    /// Order rejected by broker.
    #[error("Order rejected: {reason}")]
    OrderRejected {
        /// Rejection reason.
        reason: String,
    },

    /// Order not found.
    #[error("Order not found: {order_id}")]
    OrderNotFound {
        /// The missing order ID.
        order_id: String,
    },

    /// Unknown error.
    #[error("Broker error: {message}")]
    Unknown {
        /// Error details.
        message: String,
    },
}

impl BrokerError {
    /// Errors worth retrying at the next poll.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionError { .. } | Self::RateLimited)
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionError { .. } => "connection",
            Self::RateLimited => "rate_limited",
            Self::OrderRejected { .. } => "rejected",
            Self::OrderNotFound { .. } => "not_found",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Port for broker interactions.
///
/// Implementations must tolerate concurrent calls from many monitors.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Place an order.
    async fn place_order(&self, request: OrderRequest) -> Result<OrderAck, BrokerError>;

    /// Query whether an order has filled. Idempotent.
    async fn get_fill_status(&self, order_id: &OrderId) -> Result<FillStatus, BrokerError>;

    /// Request cancellation. Idempotent.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelAck, BrokerError>;

    /// Current quote for a symbol.
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError>;
}
