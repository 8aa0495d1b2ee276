//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use bracket_engine::application::services::MonitorScheduler;
use bracket_engine::application::use_cases::PlaceOrderUseCase;
use bracket_engine::config::{DefaultsConfig, MonitoringConfig};
use bracket_engine::domain::order_intent::{
    BracketSpec, ConfirmedStopSpec, ExitSpec, Offset, OrderIntent, OrderKind, OrderSide,
    ProfitTarget,
};
use bracket_engine::domain::shared::{Quantity, Symbol};
use bracket_engine::infrastructure::broker::MockBroker;
use bracket_engine::infrastructure::events::InMemoryStatusPublisher;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

/// Engine wired to a scripted broker and a recording publisher.
pub struct Harness {
    pub broker: Arc<MockBroker>,
    pub publisher: Arc<InMemoryStatusPublisher>,
    pub scheduler: Arc<MonitorScheduler>,
    pub use_case: PlaceOrderUseCase,
}

impl Harness {
    pub fn new(broker: MockBroker) -> Self {
        Self::with_config(broker, MonitoringConfig::default())
    }

    pub fn with_config(broker: MockBroker, config: MonitoringConfig) -> Self {
        let broker = Arc::new(broker);
        let publisher = Arc::new(InMemoryStatusPublisher::new());
        let scheduler = Arc::new(MonitorScheduler::new(
            broker.clone(),
            publisher.clone(),
            config,
            CancellationToken::new(),
        )
        .unwrap());
        let use_case =
            PlaceOrderUseCase::new(broker.clone(), scheduler.clone(), DefaultsConfig::default());
        Self {
            broker,
            publisher,
            scheduler,
            use_case,
        }
    }
}

pub fn intent(symbol: &str, side: OrderSide, shares: u32, exit: ExitSpec) -> OrderIntent {
    OrderIntent::new(
        Symbol::new(symbol),
        side,
        Quantity::new(shares).unwrap(),
        OrderKind::Market,
        Some(exit),
    )
    .unwrap()
}

pub fn profit_target_percent(pct: Decimal, fill_timeout_secs: u64) -> ExitSpec {
    ExitSpec::ProfitTarget(
        ProfitTarget::new(
            Offset::percent(pct).unwrap(),
            Duration::from_secs(fill_timeout_secs),
        )
        .unwrap(),
    )
}

/// Confirmation +1%, stop $3, target $3, fill timeout 15 s, confirmation 300 s.
pub fn standard_bracket() -> ExitSpec {
    ExitSpec::Bracket(
        BracketSpec::new(
            Offset::percent(dec!(1)).unwrap(),
            Duration::from_secs(300),
            Offset::dollar(dec!(3)).unwrap(),
            Offset::dollar(dec!(3)).unwrap(),
            Duration::from_secs(15),
        )
        .unwrap(),
    )
}

pub fn bracket(confirmation: Offset, stop: Offset, profit: Offset) -> ExitSpec {
    ExitSpec::Bracket(
        BracketSpec::new(
            confirmation,
            Duration::from_secs(300),
            stop,
            profit,
            Duration::from_secs(15),
        )
        .unwrap(),
    )
}

pub fn confirmed_stop(confirmation: Offset, stop: Offset) -> ExitSpec {
    ExitSpec::ConfirmedStop(
        ConfirmedStopSpec::new(
            confirmation,
            Duration::from_secs(300),
            stop,
            Duration::from_secs(15),
        )
        .unwrap(),
    )
}

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}
