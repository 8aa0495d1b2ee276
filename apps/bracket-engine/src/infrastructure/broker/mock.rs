//! Scripted broker for deterministic tests.
//!
//! Market orders (and any order without a scripted plan or price path) fill
//! according to the default [`FillPlan`], measured from each order's own
//! placement time. Limit and stop-limit orders on a symbol with a price path
//! fill when the path's current price crosses their level. Time is
//! `tokio::time`, so paused-clock tests advance it deterministically.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::application::ports::{
    BrokerError, BrokerPort, CancelAck, FillStatus, OrderAck, OrderRequest, OrderType, Quote,
};
use crate::domain::order_intent::OrderSide;
use crate::domain::shared::{OrderId, Symbol};

/// When a scripted order fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPlan {
    /// Never fills.
    Never,
    /// Fills `delay` after placement at `price`.
    After {
        /// Time from placement to fill.
        delay: Duration,
        /// Fill price.
        price: Decimal,
    },
}

impl FillPlan {
    /// Fill `delay` after placement at `price`.
    #[must_use]
    pub const fn after(delay: Duration, price: Decimal) -> Self {
        Self::After { delay, price }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockStatus {
    Open,
    Filled(Decimal),
    Canceled,
}

#[derive(Debug)]
struct MockOrder {
    id: OrderId,
    request: OrderRequest,
    placed_at: Instant,
    plan: Option<FillPlan>,
    status: MockStatus,
}

#[derive(Debug, Default)]
struct MockState {
    orders: Vec<MockOrder>,
    place_calls: usize,
    status_errors: VecDeque<BrokerError>,
    quote_errors: VecDeque<BrokerError>,
    status_calls: HashMap<OrderId, usize>,
    cancel_calls: Vec<OrderId>,
}

/// Scripted in-memory broker.
#[derive(Debug)]
pub struct MockBroker {
    created: Instant,
    default_plan: FillPlan,
    order_plans: HashMap<usize, FillPlan>,
    placement_failures: HashMap<usize, BrokerError>,
    quote_paths: HashMap<Symbol, Vec<(Duration, Decimal)>>,
    cancels_fail: bool,
    state: Mutex<MockState>,
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBroker {
    /// Broker whose orders never fill.
    #[must_use]
    pub fn new() -> Self {
        Self {
            created: Instant::now(),
            default_plan: FillPlan::Never,
            order_plans: HashMap::new(),
            placement_failures: HashMap::new(),
            quote_paths: HashMap::new(),
            cancels_fail: false,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Plan for orders without a more specific rule.
    #[must_use]
    pub fn with_fill_plan(mut self, plan: FillPlan) -> Self {
        self.default_plan = plan;
        self
    }

    /// Plan for the `nth` placed order (0-based), overriding every other rule.
    #[must_use]
    pub fn with_order_plan(mut self, nth: usize, plan: FillPlan) -> Self {
        self.order_plans.insert(nth, plan);
        self
    }

    /// Make the `nth` `place_order` call (0-based) fail with `error`.
    #[must_use]
    pub fn fail_placement(mut self, nth: usize, error: BrokerError) -> Self {
        self.placement_failures.insert(nth, error);
        self
    }

    /// Price path for a symbol as `(time since broker creation, price)` points.
    ///
    /// The price at time `t` is the last point at or before `t`.
    #[must_use]
    pub fn with_quote_path(mut self, symbol: &str, path: Vec<(Duration, Decimal)>) -> Self {
        self.quote_paths.insert(Symbol::new(symbol), path);
        self
    }

    /// Constant price for a symbol.
    #[must_use]
    pub fn with_price(self, symbol: &str, price: Decimal) -> Self {
        self.with_quote_path(symbol, vec![(Duration::ZERO, price)])
    }

    /// Acknowledge no cancel (`success = false`).
    #[must_use]
    pub fn fail_cancels(mut self) -> Self {
        self.cancels_fail = true;
        self
    }

    /// The next `get_fill_status` call returns `error`.
    pub fn fail_next_status(&self, error: BrokerError) {
        self.state.lock().status_errors.push_back(error);
    }

    /// The next `get_quote` call returns `error`.
    pub fn fail_next_quote(&self, error: BrokerError) {
        self.state.lock().quote_errors.push_back(error);
    }

    /// Accepted orders in placement order.
    #[must_use]
    pub fn placed_orders(&self) -> Vec<(OrderId, OrderRequest)> {
        self.state
            .lock()
            .orders
            .iter()
            .map(|o| (o.id.clone(), o.request.clone()))
            .collect()
    }

    /// Every cancel request received, including repeats.
    #[must_use]
    pub fn cancel_calls(&self) -> Vec<OrderId> {
        self.state.lock().cancel_calls.clone()
    }

    /// Number of cancel requests received.
    #[must_use]
    pub fn cancel_count(&self) -> usize {
        self.state.lock().cancel_calls.len()
    }

    /// Number of fill status queries for `order_id`.
    #[must_use]
    pub fn status_calls(&self, order_id: &OrderId) -> usize {
        self.state
            .lock()
            .status_calls
            .get(order_id)
            .copied()
            .unwrap_or(0)
    }

    fn price_at(&self, symbol: &Symbol, now: Instant) -> Option<Decimal> {
        let path = self.quote_paths.get(symbol)?;
        let since = now.saturating_duration_since(self.created);
        path.iter()
            .take_while(|(at, _)| *at <= since)
            .last()
            .or_else(|| path.first())
            .map(|(_, price)| *price)
    }

    fn crossing_fill(request: &OrderRequest, price: Decimal) -> Option<Decimal> {
        let limit = request.limit_price?;
        match (request.order_type, request.side) {
            (OrderType::Limit, OrderSide::Buy) if price <= limit => Some(limit),
            (OrderType::Limit, OrderSide::Sell) if price >= limit => Some(limit),
            (OrderType::StopLimit, OrderSide::Sell)
                if request.stop_price.is_some_and(|stop| price <= stop) =>
            {
                Some(limit)
            }
            (OrderType::StopLimit, OrderSide::Buy)
                if request.stop_price.is_some_and(|stop| price >= stop) =>
            {
                Some(limit)
            }
            _ => None,
        }
    }

    fn resolve_fill(&self, order: &MockOrder, now: Instant) -> Option<Decimal> {
        let plan = match order.plan {
            Some(plan) => plan,
            None if order.request.order_type != OrderType::Market
                && self.quote_paths.contains_key(&order.request.symbol) =>
            {
                let price = self.price_at(&order.request.symbol, now)?;
                return Self::crossing_fill(&order.request, price);
            }
            None => self.default_plan,
        };
        match plan {
            FillPlan::Never => None,
            FillPlan::After { delay, price } => {
                (now.saturating_duration_since(order.placed_at) >= delay).then_some(price)
            }
        }
    }
}

#[async_trait]
impl BrokerPort for MockBroker {
    async fn place_order(&self, request: OrderRequest) -> Result<OrderAck, BrokerError> {
        let mut state = self.state.lock();
        let call = state.place_calls;
        state.place_calls += 1;
        if let Some(error) = self.placement_failures.get(&call) {
            return Err(error.clone());
        }

        let index = state.orders.len();
        let id = OrderId::new(format!("mock-{}", index + 1));
        state.orders.push(MockOrder {
            id: id.clone(),
            request,
            placed_at: Instant::now(),
            plan: self.order_plans.get(&call).copied(),
            status: MockStatus::Open,
        });
        Ok(OrderAck { order_id: id })
    }

    async fn get_fill_status(&self, order_id: &OrderId) -> Result<FillStatus, BrokerError> {
        let now = Instant::now();
        let mut state = self.state.lock();
        *state.status_calls.entry(order_id.clone()).or_insert(0) += 1;
        if let Some(error) = state.status_errors.pop_front() {
            return Err(error);
        }

        let Some(index) = state.orders.iter().position(|o| &o.id == order_id) else {
            return Err(BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            });
        };
        let fill = match state.orders[index].status {
            MockStatus::Filled(price) => return Ok(FillStatus::filled(price)),
            MockStatus::Canceled => return Ok(FillStatus::pending()),
            MockStatus::Open => self.resolve_fill(&state.orders[index], now),
        };
        Ok(match fill {
            Some(price) => {
                state.orders[index].status = MockStatus::Filled(price);
                FillStatus::filled(price)
            }
            None => FillStatus::pending(),
        })
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelAck, BrokerError> {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.cancel_calls.push(order_id.clone());

        let Some(index) = state.orders.iter().position(|o| &o.id == order_id) else {
            return Err(BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            });
        };
        if self.cancels_fail {
            return Ok(CancelAck { success: false });
        }
        // An order whose fill is already due cannot be withdrawn.
        if state.orders[index].status == MockStatus::Open
            && let Some(price) = self.resolve_fill(&state.orders[index], now)
        {
            state.orders[index].status = MockStatus::Filled(price);
        }
        let success = state.orders[index].status == MockStatus::Open;
        if success {
            state.orders[index].status = MockStatus::Canceled;
        }
        Ok(CancelAck { success })
    }

    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError> {
        if let Some(error) = self.state.lock().quote_errors.pop_front() {
            return Err(error);
        }
        let last = self
            .price_at(symbol, Instant::now())
            .ok_or_else(|| BrokerError::Unknown {
                message: format!("no quote for {symbol}"),
            })?;
        let tick = Decimal::new(1, 2);
        Ok(Quote {
            bid: last - tick,
            ask: last + tick,
            last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Quantity;
    use rust_decimal_macros::dec;

    fn market() -> OrderRequest {
        OrderRequest::market(Symbol::new("MSFT"), OrderSide::Buy, Quantity::new(1).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn fill_plan_is_relative_to_placement() {
        let broker = MockBroker::new().with_fill_plan(FillPlan::after(Duration::from_secs(2), dec!(10)));
        tokio::time::sleep(Duration::from_secs(5)).await;
        let id = broker.place_order(market()).await.unwrap().order_id;
        assert_eq!(id.as_str(), "mock-1");

        assert!(!broker.get_fill_status(&id).await.unwrap().filled);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(broker.get_fill_status(&id).await.unwrap(), FillStatus::filled(dec!(10)));
        assert_eq!(broker.status_calls(&id), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_open_then_repeat_reports_failure() {
        let broker = MockBroker::new();
        let id = broker.place_order(market()).await.unwrap().order_id;
        assert!(broker.cancel_order(&id).await.unwrap().success);
        assert!(!broker.cancel_order(&id).await.unwrap().success);
        assert_eq!(broker.cancel_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_of_due_fill_fails() {
        let broker = MockBroker::new().with_fill_plan(FillPlan::after(Duration::ZERO, dec!(10)));
        let id = broker.place_order(market()).await.unwrap().order_id;
        assert!(!broker.cancel_order(&id).await.unwrap().success);
        assert!(broker.get_fill_status(&id).await.unwrap().filled);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_order_is_not_found() {
        let broker = MockBroker::new();
        assert!(matches!(
            broker.cancel_order(&OrderId::new("x")).await,
            Err(BrokerError::OrderNotFound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn limit_and_stop_fill_on_path_crossing() {
        let broker = MockBroker::new().with_quote_path(
            "MSFT",
            vec![
                (Duration::ZERO, dec!(100)),
                (Duration::from_secs(10), dec!(103.5)),
                (Duration::from_secs(20), dec!(96.5)),
            ],
        );
        let symbol = Symbol::new("MSFT");
        let qty = Quantity::new(1).unwrap();
        let target = broker
            .place_order(OrderRequest::limit(symbol.clone(), OrderSide::Sell, qty, dec!(103)))
            .await
            .unwrap()
            .order_id;
        let stop = broker
            .place_order(OrderRequest::stop_limit(symbol.clone(), OrderSide::Sell, qty, dec!(97), dec!(96.99)))
            .await
            .unwrap()
            .order_id;

        assert!(!broker.get_fill_status(&target).await.unwrap().filled);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(broker.get_fill_status(&target).await.unwrap(), FillStatus::filled(dec!(103)));
        assert!(!broker.get_fill_status(&stop).await.unwrap().filled);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(broker.get_fill_status(&stop).await.unwrap(), FillStatus::filled(dec!(96.99)));

        let quote = broker.get_quote(&symbol).await.unwrap();
        assert_eq!(quote.last, dec!(96.5));
        assert_eq!(quote.bid, dec!(96.49));
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_failures_are_consumed() {
        let broker = MockBroker::new()
            .with_price("MSFT", dec!(50))
            .fail_placement(0, BrokerError::RateLimited);
        assert!(broker.place_order(market()).await.is_err());
        let id = broker.place_order(market()).await.unwrap().order_id;
        assert_eq!(id.as_str(), "mock-1");

        broker.fail_next_status(BrokerError::RateLimited);
        assert!(broker.get_fill_status(&id).await.is_err());
        assert!(broker.get_fill_status(&id).await.is_ok());

        broker.fail_next_quote(BrokerError::RateLimited);
        assert!(broker.get_quote(&Symbol::new("MSFT")).await.is_err());
        assert_eq!(broker.get_quote(&Symbol::new("MSFT")).await.unwrap().last, dec!(50));
    }
}
