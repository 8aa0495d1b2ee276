//! Status events, snapshots and final outcomes.
//!
//! Events are emitted once per state transition. Snapshots carry the
//! latest readout (including confirmation progress) between transitions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_intent::OrderSide;
use crate::domain::pricing::BracketLevels;
use crate::domain::shared::{OrderId, Quantity, Symbol};

use super::monitored_order::MonitoredOrder;
use super::state::MonitorState;

/// Status notification for one lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Entry order id.
    pub order_id: OrderId,
    /// Instrument.
    pub symbol: Symbol,
    /// Entry side.
    pub side: OrderSide,
    /// Entry quantity.
    pub quantity: Quantity,
    /// State entered.
    pub state: MonitorState,
    /// Entry fill price, once known.
    pub fill_price: Option<Decimal>,
    /// Confirmation trigger, once known.
    pub trigger_price: Option<Decimal>,
    /// Stop leg order id, once placed.
    pub stop_order_id: Option<OrderId>,
    /// Profit leg order id, once placed.
    pub profit_order_id: Option<OrderId>,
    /// Human-readable description.
    pub message: String,
    /// When the transition happened.
    pub occurred_at: DateTime<Utc>,
}

impl StatusEvent {
    /// Build an event from the order's current state.
    #[must_use]
    pub fn from_order(order: &MonitoredOrder, message: impl Into<String>) -> Self {
        Self {
            order_id: order.order_id().clone(),
            symbol: order.symbol().clone(),
            side: order.side(),
            quantity: order.quantity(),
            state: order.state(),
            fill_price: order.fill_price(),
            trigger_price: order.levels().map(|l| l.trigger),
            stop_order_id: order.stop_order_id().cloned(),
            profit_order_id: order.profit_order_id().cloned(),
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }

    /// Stable state tag.
    #[must_use]
    pub const fn state_tag(&self) -> &'static str {
        self.state.tag()
    }
}

/// Point-in-time view of a monitor, for queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    /// Entry order id.
    pub order_id: OrderId,
    /// Instrument.
    pub symbol: Symbol,
    /// Entry side.
    pub side: OrderSide,
    /// Entry quantity.
    pub quantity: Quantity,
    /// Strategy label (`profit_target`, `bracket`, `confirmed_stop`).
    pub strategy: String,
    /// Current state.
    pub state: MonitorState,
    /// Entry fill price, once known.
    pub fill_price: Option<Decimal>,
    /// Derived exit levels, once known.
    pub levels: Option<BracketLevels>,
    /// Latest observed price during confirmation.
    pub last_price: Option<Decimal>,
    /// Confirmation progress in percent.
    pub progress_pct: Option<Decimal>,
    /// Stop leg order id, once placed.
    pub stop_order_id: Option<OrderId>,
    /// Profit leg order id, once placed.
    pub profit_order_id: Option<OrderId>,
    /// When monitoring started.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl MonitorSnapshot {
    /// Capture the order's current readout.
    #[must_use]
    pub fn of(order: &MonitoredOrder) -> Self {
        Self {
            order_id: order.order_id().clone(),
            symbol: order.symbol().clone(),
            side: order.side(),
            quantity: order.quantity(),
            strategy: order.exit().label().to_string(),
            state: order.state(),
            fill_price: order.fill_price(),
            levels: order.levels().copied(),
            last_price: order.last_price(),
            progress_pct: order.progress_pct(),
            stop_order_id: order.stop_order_id().cloned(),
            profit_order_id: order.profit_order_id().cloned(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

/// Final result of a monitor, delivered once it stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorOutcome {
    /// Entry order id.
    pub order_id: OrderId,
    /// Terminal state.
    pub state: MonitorState,
    /// Entry fill price, if it filled.
    pub fill_price: Option<Decimal>,
    /// Exit leg order ids that were placed.
    pub exit_order_ids: Vec<OrderId>,
    /// An exit order could not be placed after the fill.
    pub exit_placement_failed: bool,
    /// The sibling leg cancel was not acknowledged.
    pub sibling_cancel_failed: bool,
    /// Realised profit per share when an exit leg filled.
    pub pnl_per_share: Option<Decimal>,
    /// Final message.
    pub message: String,
}

impl MonitorOutcome {
    /// Build the outcome from the order's terminal state.
    #[must_use]
    pub fn from_order(order: &MonitoredOrder, message: impl Into<String>) -> Self {
        let exit_order_ids = [order.stop_order_id(), order.profit_order_id()]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        Self {
            order_id: order.order_id().clone(),
            state: order.state(),
            fill_price: order.fill_price(),
            exit_order_ids,
            exit_placement_failed: false,
            sibling_cancel_failed: false,
            pnl_per_share: None,
            message: message.into(),
        }
    }
}
