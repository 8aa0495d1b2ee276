//! Paper broker: a simulated market for running the engine without a
//! brokerage account.
//!
//! Each symbol's last price follows a bounded random walk that is advanced
//! lazily, one step per `step_interval` of elapsed time, whenever the symbol
//! is touched. Fill rules:
//!
//! - MARKET fills `market_fill_delay` after placement at the ask (buy) or bid (sell)
//! - LIMIT buy fills once the ask is at or below the limit; sell once the bid is at or above
//! - STOP_LIMIT triggers when the last price crosses the stop, then rests as a limit
//!
//! Filled and canceled orders stay queryable for [`TERMINAL_RETENTION`] after
//! they finish and are swept on the next placement.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::application::ports::{
    BrokerError, BrokerPort, CancelAck, FillStatus, OrderAck, OrderRequest, OrderType, Quote,
};
use crate::config::PaperBrokerConfig;
use crate::domain::order_intent::OrderSide;
use crate::domain::pricing::round_to_cent;
use crate::domain::shared::{OrderId, Symbol};

/// Upper bound on lazily replayed steps per touch.
const MAX_CATCH_UP_STEPS: u64 = 10_000;

/// How long a finished order is kept for late status or cancel calls.
pub const TERMINAL_RETENTION: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct Book {
    last: Decimal,
    stepped_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaperStatus {
    Open { triggered: bool },
    Filled(Decimal),
    Canceled,
}

#[derive(Debug)]
struct PaperOrder {
    request: OrderRequest,
    placed_at: Instant,
    status: PaperStatus,
    finished_at: Option<Instant>,
}

#[derive(Debug)]
struct Market {
    rng: StdRng,
    books: HashMap<Symbol, Book>,
    orders: HashMap<OrderId, PaperOrder>,
}

/// Simulated broker.
#[derive(Debug)]
pub struct PaperBroker {
    config: PaperBrokerConfig,
    half_spread: Decimal,
    step: Duration,
    market: Mutex<Market>,
}

impl PaperBroker {
    /// Create a paper broker from configuration.
    #[must_use]
    pub fn new(config: PaperBrokerConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            half_spread: Decimal::new(i64::from(config.half_spread_cents), 2),
            step: Duration::from_millis(config.step_interval_ms.max(1)),
            market: Mutex::new(Market {
                rng,
                books: HashMap::new(),
                orders: HashMap::new(),
            }),
            config,
        }
    }

    fn quote_for(&self, last: Decimal) -> Quote {
        let floor = Decimal::new(1, 2);
        Quote {
            bid: (last - self.half_spread).max(floor),
            ask: last + self.half_spread,
            last,
        }
    }

    /// Advance `symbol`'s walk to `now` and return its last price.
    fn advance(&self, market: &mut Market, symbol: &Symbol, now: Instant) -> Decimal {
        let Market { rng, books, .. } = market;
        let book = books.entry(symbol.clone()).or_insert_with(|| Book {
            last: self.config.initial_price(symbol.as_str()),
            stepped_at: now,
        });

        let elapsed = now.saturating_duration_since(book.stepped_at);
        let steps = (elapsed.as_millis() / self.step.as_millis()) as u64;
        if steps == 0 {
            return book.last;
        }

        let bps = i64::from(self.config.volatility_bps);
        for _ in 0..steps.min(MAX_CATCH_UP_STEPS) {
            let change_bps = if bps == 0 {
                0
            } else {
                rng.random_range(-bps..=bps)
            };
            let factor = Decimal::ONE + Decimal::new(change_bps, 4);
            book.last = round_to_cent(book.last * factor).max(Decimal::new(1, 2));
        }
        book.stepped_at += self.step * u32::try_from(steps).unwrap_or(u32::MAX);
        book.last
    }

    fn evaluate(&self, order: &mut PaperOrder, quote: &Quote, now: Instant) {
        let PaperStatus::Open { triggered } = order.status else {
            return;
        };
        let request = &order.request;
        let fill = match request.order_type {
            OrderType::Market => {
                let delay = Duration::from_millis(self.config.market_fill_delay_ms);
                (now.saturating_duration_since(order.placed_at) >= delay).then(|| match request.side {
                    OrderSide::Buy => quote.ask,
                    OrderSide::Sell => quote.bid,
                })
            }
            OrderType::Limit => limit_fill(request.side, request.limit_price, quote),
            OrderType::StopLimit => {
                let crossed = request.stop_price.is_some_and(|stop| match request.side {
                    OrderSide::Buy => quote.last >= stop,
                    OrderSide::Sell => quote.last <= stop,
                });
                if triggered || crossed {
                    order.status = PaperStatus::Open { triggered: true };
                    limit_fill(request.side, request.limit_price, quote)
                } else {
                    None
                }
            }
        };
        if let Some(price) = fill {
            order.status = PaperStatus::Filled(price);
            order.finished_at = Some(now);
        }
    }
}

fn limit_fill(side: OrderSide, limit: Option<Decimal>, quote: &Quote) -> Option<Decimal> {
    let limit = limit?;
    match side {
        OrderSide::Buy if quote.ask <= limit => Some(quote.ask),
        OrderSide::Sell if quote.bid >= limit => Some(quote.bid),
        _ => None,
    }
}

#[async_trait]
impl BrokerPort for PaperBroker {
    async fn place_order(&self, request: OrderRequest) -> Result<OrderAck, BrokerError> {
        let invalid_price = [request.limit_price, request.stop_price]
            .into_iter()
            .flatten()
            .any(|price| price <= Decimal::ZERO);
        if invalid_price {
            return Err(BrokerError::OrderRejected {
                reason: "prices must be positive".to_string(),
            });
        }

        let now = Instant::now();
        let order_id = OrderId::generate();
        let mut market = self.market.lock();
        let before = market.orders.len();
        market.orders.retain(|_, order| {
            order
                .finished_at
                .is_none_or(|at| now.saturating_duration_since(at) < TERMINAL_RETENTION)
        });
        let pruned = before - market.orders.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned finished paper orders");
        }
        self.advance(&mut market, &request.symbol, now);
        tracing::debug!(
            order_id = %order_id,
            symbol = %request.symbol,
            side = %request.side,
            order_type = %request.order_type,
            "Paper order accepted"
        );
        market.orders.insert(
            order_id.clone(),
            PaperOrder {
                request,
                placed_at: now,
                status: PaperStatus::Open { triggered: false },
                finished_at: None,
            },
        );
        Ok(OrderAck { order_id })
    }

    async fn get_fill_status(&self, order_id: &OrderId) -> Result<FillStatus, BrokerError> {
        let now = Instant::now();
        let mut market = self.market.lock();
        let symbol = market
            .orders
            .get(order_id)
            .map(|o| o.request.symbol.clone())
            .ok_or_else(|| BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        let last = self.advance(&mut market, &symbol, now);
        let quote = self.quote_for(last);

        let Some(order) = market.orders.get_mut(order_id) else {
            return Err(BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            });
        };
        self.evaluate(order, &quote, now);
        Ok(match order.status {
            PaperStatus::Filled(price) => FillStatus::filled(price),
            PaperStatus::Open { .. } | PaperStatus::Canceled => FillStatus::pending(),
        })
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelAck, BrokerError> {
        let now = Instant::now();
        let mut market = self.market.lock();
        let symbol = market
            .orders
            .get(order_id)
            .map(|o| o.request.symbol.clone())
            .ok_or_else(|| BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        let last = self.advance(&mut market, &symbol, now);
        let quote = self.quote_for(last);

        let Some(order) = market.orders.get_mut(order_id) else {
            return Err(BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            });
        };
        self.evaluate(order, &quote, now);
        let success = matches!(order.status, PaperStatus::Open { .. });
        if success {
            order.status = PaperStatus::Canceled;
            order.finished_at = Some(now);
        }
        Ok(CancelAck { success })
    }

    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError> {
        let mut market = self.market.lock();
        let last = self.advance(&mut market, symbol, Instant::now());
        Ok(self.quote_for(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Quantity;
    use rust_decimal_macros::dec;

    fn broker(volatility_bps: u32) -> PaperBroker {
        PaperBroker::new(PaperBrokerConfig {
            seed: Some(7),
            volatility_bps,
            ..PaperBrokerConfig::default()
        })
    }

    fn symbol() -> Symbol {
        Symbol::new("MSFT")
    }

    #[tokio::test(start_paused = true)]
    async fn flat_market_quotes_around_initial_price() {
        let broker = broker(0);
        tokio::time::sleep(Duration::from_secs(5)).await;
        let quote = broker.get_quote(&symbol()).await.unwrap();
        assert_eq!(quote.last, dec!(100));
        assert_eq!(quote.bid, dec!(99.99));
        assert_eq!(quote.ask, dec!(100.01));
    }

    #[tokio::test(start_paused = true)]
    async fn market_order_fills_after_delay() {
        let broker = broker(0);
        let id = broker
            .place_order(OrderRequest::market(symbol(), OrderSide::Buy, Quantity::new(10).unwrap()))
            .await
            .unwrap()
            .order_id;
        assert!(!broker.get_fill_status(&id).await.unwrap().filled);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(broker.get_fill_status(&id).await.unwrap(), FillStatus::filled(dec!(100.01)));
        assert!(!broker.cancel_order(&id).await.unwrap().success);
    }

    #[tokio::test(start_paused = true)]
    async fn resting_limit_can_be_canceled_once() {
        let broker = broker(0);
        let id = broker
            .place_order(OrderRequest::limit(
                symbol(),
                OrderSide::Sell,
                Quantity::new(10).unwrap(),
                dec!(105),
            ))
            .await
            .unwrap()
            .order_id;
        assert!(broker.cancel_order(&id).await.unwrap().success);
        assert!(!broker.cancel_order(&id).await.unwrap().success);
        assert!(!broker.get_fill_status(&id).await.unwrap().filled);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_limit_rests_until_crossed() {
        let broker = broker(0);
        let id = broker
            .place_order(OrderRequest::stop_limit(
                symbol(),
                OrderSide::Buy,
                Quantity::new(1).unwrap(),
                dec!(100.5),
                dec!(100.51),
            ))
            .await
            .unwrap()
            .order_id;
        assert!(!broker.get_fill_status(&id).await.unwrap().filled);
    }

    #[tokio::test(start_paused = true)]
    async fn walk_is_deterministic_for_a_seed() {
        let a = broker(25);
        let b = broker(25);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(
            a.get_quote(&symbol()).await.unwrap(),
            b.get_quote(&symbol()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn unknown_order_and_bad_price_are_errors() {
        let broker = broker(0);
        assert!(matches!(
            broker.get_fill_status(&OrderId::new("nope")).await,
            Err(BrokerError::OrderNotFound { .. })
        ));
        let result = broker
            .place_order(OrderRequest::limit(
                symbol(),
                OrderSide::Buy,
                Quantity::new(1).unwrap(),
                Decimal::ZERO,
            ))
            .await;
        assert!(matches!(result, Err(BrokerError::OrderRejected { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_orders_are_swept_after_retention() {
        let broker = broker(0);
        let limit = |price| {
            OrderRequest::limit(symbol(), OrderSide::Sell, Quantity::new(1).unwrap(), price)
        };
        let canceled = broker.place_order(limit(dec!(105))).await.unwrap().order_id;
        let resting = broker.place_order(limit(dec!(110))).await.unwrap().order_id;
        assert!(broker.cancel_order(&canceled).await.unwrap().success);

        // Still answerable shortly after finishing.
        tokio::time::sleep(Duration::from_secs(10)).await;
        broker.place_order(limit(dec!(120))).await.unwrap();
        assert!(!broker.cancel_order(&canceled).await.unwrap().success);

        tokio::time::sleep(TERMINAL_RETENTION).await;
        broker.place_order(limit(dec!(120))).await.unwrap();
        assert!(matches!(
            broker.get_fill_status(&canceled).await,
            Err(BrokerError::OrderNotFound { .. })
        ));
        assert!(!broker.get_fill_status(&resting).await.unwrap().filled);
        assert_eq!(broker.market.lock().orders.len(), 3);
    }
}
