//! MonitoredOrder entity.
//!
//! Runtime record of one entry order and everything derived from it. Owned
//! exclusively by its monitor task.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::domain::order_intent::{ExitSpec, OrderSide};
use crate::domain::pricing::BracketLevels;
use crate::domain::shared::{DomainError, OrderId, Quantity, Symbol};

use super::state::{ExitLeg, MonitorState};
use super::state_machine::MonitorStateMachine;

/// Mutable state of a monitored entry order.
#[derive(Debug, Clone)]
pub struct MonitoredOrder {
    order_id: OrderId,
    symbol: Symbol,
    side: OrderSide,
    quantity: Quantity,
    exit: ExitSpec,
    state: MonitorState,
    fill_price: Option<Decimal>,
    levels: Option<BracketLevels>,
    stop_order_id: Option<OrderId>,
    profit_order_id: Option<OrderId>,
    cancels_issued: HashSet<OrderId>,
    last_price: Option<Decimal>,
    progress_pct: Option<Decimal>,
    started_at: Instant,
    filled_at: Option<Instant>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MonitoredOrder {
    /// Start tracking a freshly placed entry order.
    ///
    /// The initial state depends on the exit kind.
    #[must_use]
    pub fn new(
        order_id: OrderId,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        exit: ExitSpec,
        started_at: Instant,
    ) -> Self {
        let state = match exit {
            ExitSpec::ProfitTarget(_) => MonitorState::AwaitingFill,
            ExitSpec::Bracket(_) | ExitSpec::ConfirmedStop(_) => MonitorState::AwaitingEntryFill,
        };
        let now = Utc::now();
        Self {
            order_id,
            symbol,
            side,
            quantity,
            exit,
            state,
            fill_price: None,
            levels: None,
            stop_order_id: None,
            profit_order_id: None,
            cancels_issued: HashSet::new(),
            last_price: None,
            progress_pct: None,
            started_at,
            filled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Entry order id.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
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

    /// Entry quantity (exit legs use the same).
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Exit specification.
    #[must_use]
    pub const fn exit(&self) -> &ExitSpec {
        &self.exit
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> MonitorState {
        self.state
    }

    /// Entry fill price, once known.
    #[must_use]
    pub const fn fill_price(&self) -> Option<Decimal> {
        self.fill_price
    }

    /// Derived exit levels, once the fill is known.
    #[must_use]
    pub const fn levels(&self) -> Option<&BracketLevels> {
        self.levels.as_ref()
    }

    /// Stop leg order id, once placed.
    #[must_use]
    pub const fn stop_order_id(&self) -> Option<&OrderId> {
        self.stop_order_id.as_ref()
    }

    /// Profit leg order id, once placed.
    #[must_use]
    pub const fn profit_order_id(&self) -> Option<&OrderId> {
        self.profit_order_id.as_ref()
    }

    /// Order id of an exit leg.
    #[must_use]
    pub const fn leg_order_id(&self, leg: ExitLeg) -> Option<&OrderId> {
        match leg {
            ExitLeg::Stop => self.stop_order_id(),
            ExitLeg::Profit => self.profit_order_id(),
        }
    }

    /// Latest observed price while awaiting confirmation.
    #[must_use]
    pub const fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    /// Latest confirmation progress percentage.
    #[must_use]
    pub const fn progress_pct(&self) -> Option<Decimal> {
        self.progress_pct
    }

    /// Wall-clock creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Wall-clock time of the last mutation.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true once the monitor has stopped.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Time since monitoring started.
    #[must_use]
    pub fn elapsed_since_start(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Time since the entry fill was observed, if it was.
    #[must_use]
    pub fn elapsed_since_fill(&self, now: Instant) -> Option<Duration> {
        self.filled_at.map(|at| now.saturating_duration_since(at))
    }

    /// Move to a new state through the transition table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the move is not allowed.
    pub fn transition_to(&mut self, to: MonitorState) -> Result<(), DomainError> {
        MonitorStateMachine::validate_transition(self.state, to)?;
        self.state = to;
        self.touch();
        Ok(())
    }

    /// Record the entry fill. The price is written once.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` on a second call.
    pub fn record_fill(&mut self, price: Decimal, at: Instant) -> Result<(), DomainError> {
        if let Some(existing) = self.fill_price {
            return Err(DomainError::InvariantViolation {
                invariant: "fill price is written once".to_string(),
                detail: format!("{} already filled at {existing}", self.order_id),
            });
        }
        self.fill_price = Some(price);
        self.filled_at = Some(at);
        self.touch();
        Ok(())
    }

    /// Store the levels derived from the fill.
    pub fn set_levels(&mut self, levels: BracketLevels) {
        self.levels = Some(levels);
        self.touch();
    }

    /// Remember an exit leg's broker order id.
    pub fn record_exit_leg(&mut self, leg: ExitLeg, order_id: OrderId) {
        match leg {
            ExitLeg::Stop => self.stop_order_id = Some(order_id),
            ExitLeg::Profit => self.profit_order_id = Some(order_id),
        }
        self.touch();
    }

    /// Update the confirmation readout without changing state.
    pub fn observe_price(&mut self, price: Decimal, progress_pct: Decimal) {
        self.last_price = Some(price);
        self.progress_pct = Some(progress_pct);
        self.touch();
    }

    /// Claim the right to cancel `order_id`.
    ///
    /// Returns false if a cancel was already issued for it.
    pub fn claim_cancel(&mut self, order_id: &OrderId) -> bool {
        self.cancels_issued.insert(order_id.clone())
    }

    /// Number of cancels issued so far.
    #[must_use]
    pub fn cancels_issued(&self) -> usize {
        self.cancels_issued.len()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
