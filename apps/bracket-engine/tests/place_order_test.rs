//! Placement use case against a strict mock broker.
//!
//! These pin down exactly which broker calls a placement makes.

use std::sync::Arc;

use async_trait::async_trait;
use bracket_engine::application::dto::{ExitRequestDto, PlaceOrderRequestDto};
use bracket_engine::application::ports::{
    BrokerError, BrokerPort, CancelAck, FillStatus, NoOpStatusPublisher, OrderAck, OrderRequest,
    OrderType, Quote,
};
use bracket_engine::application::services::MonitorScheduler;
use bracket_engine::application::use_cases::{PlaceOrderUseCase, PlacementError};
use bracket_engine::config::{DefaultsConfig, MonitoringConfig};
use bracket_engine::domain::monitoring::MonitorState;
use bracket_engine::domain::order_intent::{OrderSide, ValidationError};
use bracket_engine::domain::shared::{OrderId, Symbol};
use mockall::mock;
use mockall::predicate::eq;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

mock! {
    pub Broker {}

    #[async_trait]
    impl BrokerPort for Broker {
        async fn place_order(&self, request: OrderRequest) -> Result<OrderAck, BrokerError>;
        async fn get_fill_status(&self, order_id: &OrderId) -> Result<FillStatus, BrokerError>;
        async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelAck, BrokerError>;
        async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError>;
    }
}

fn use_case(broker: MockBroker) -> (PlaceOrderUseCase, Arc<MonitorScheduler>) {
    let broker: Arc<dyn BrokerPort> = Arc::new(broker);
    let scheduler = Arc::new(MonitorScheduler::new(
        broker.clone(),
        Arc::new(NoOpStatusPublisher),
        MonitoringConfig::default(),
        CancellationToken::new(),
    )
    .unwrap());
    let use_case = PlaceOrderUseCase::new(broker, scheduler.clone(), DefaultsConfig::default());
    (use_case, scheduler)
}

fn profit_target_request() -> PlaceOrderRequestDto {
    PlaceOrderRequestDto {
        symbol: Some("AAPL".to_string()),
        side: Some("buy".to_string()),
        quantity: Some(10),
        exit: Some(ExitRequestDto::ProfitTarget {
            offset_type: Some("percent".to_string()),
            offset: Some(dec!(2)),
            fill_timeout_secs: Some(15),
        }),
        ..PlaceOrderRequestDto::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_invalid_request_never_reaches_broker() {
    let mut broker = MockBroker::new();
    broker.expect_place_order().never();
    broker.expect_get_quote().never();
    let (use_case, scheduler) = use_case(broker);

    let request = PlaceOrderRequestDto {
        quantity: Some(0),
        ..profit_target_request()
    };
    let result = use_case.execute_request(&request).await;
    assert!(matches!(result, Err(PlacementError::Validation(_))));

    let request = PlaceOrderRequestDto {
        symbol: None,
        ..profit_target_request()
    };
    let result = use_case.execute_request(&request).await;
    assert!(matches!(
        result,
        Err(PlacementError::Validation(ValidationError::MissingField { ref field })) if field == "symbol"
    ));
    assert_eq!(scheduler.active_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_entry_starts_no_monitor() {
    let mut broker = MockBroker::new();
    broker.expect_place_order().times(1).returning(|_| {
        Err(BrokerError::OrderRejected {
            reason: "halted".to_string(),
        })
    });
    broker.expect_get_fill_status().never();
    let (use_case, scheduler) = use_case(broker);

    let result = use_case.execute_request(&profit_target_request()).await;
    assert!(matches!(
        result,
        Err(PlacementError::Entry(BrokerError::OrderRejected { .. }))
    ));
    assert_eq!(scheduler.active_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ask_sourced_limit_uses_live_quote() {
    let mut broker = MockBroker::new();
    broker
        .expect_get_quote()
        .with(eq(Symbol::new("AAPL")))
        .times(1)
        .returning(|_| {
            Ok(Quote {
                bid: dec!(189.95),
                ask: dec!(190.05),
                last: dec!(190.00),
            })
        });
    broker
        .expect_place_order()
        .withf(|request| {
            request.order_type == OrderType::Limit
                && request.side == OrderSide::Buy
                && request.limit_price == Some(dec!(190.05))
        })
        .times(1)
        .returning(|_| {
            Ok(OrderAck {
                order_id: OrderId::new("entry-1"),
            })
        });
    let (use_case, scheduler) = use_case(broker);

    let request = PlaceOrderRequestDto {
        price_type: Some("LIMIT".to_string()),
        limit_price_source: Some("ask".to_string()),
        exit: None,
        ..profit_target_request()
    };
    let receipt = use_case.execute_request(&request).await.unwrap();
    assert_eq!(receipt.order_id, OrderId::new("entry-1"));
    assert!(!receipt.monitored());
    assert_eq!(scheduler.active_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_quote_failure_places_nothing() {
    let mut broker = MockBroker::new();
    broker
        .expect_get_quote()
        .times(1)
        .returning(|_| Err(BrokerError::RateLimited));
    broker.expect_place_order().never();
    let (use_case, _scheduler) = use_case(broker);

    let request = PlaceOrderRequestDto {
        price_type: Some("limit".to_string()),
        limit_price_source: Some("bid".to_string()),
        ..profit_target_request()
    };
    let result = use_case.execute_request(&request).await;
    assert!(matches!(result, Err(PlacementError::Quote(BrokerError::RateLimited))));
}

#[tokio::test(start_paused = true)]
async fn test_placed_entry_is_monitored_until_filled() {
    let mut broker = MockBroker::new();
    broker
        .expect_place_order()
        .withf(|request| request.order_type == OrderType::Market)
        .times(1)
        .returning(|_| {
            Ok(OrderAck {
                order_id: OrderId::new("entry-7"),
            })
        });
    broker
        .expect_place_order()
        .withf(|request| {
            request.order_type == OrderType::Limit
                && request.side == OrderSide::Sell
                && request.limit_price == Some(dec!(51.00))
        })
        .times(1)
        .returning(|_| {
            Ok(OrderAck {
                order_id: OrderId::new("exit-1"),
            })
        });
    broker
        .expect_get_fill_status()
        .with(eq(OrderId::new("entry-7")))
        .times(1)
        .returning(|_| Ok(FillStatus::filled(dec!(50))));
    broker.expect_cancel_order().never();
    let (use_case, scheduler) = use_case(broker);

    let receipt = use_case.execute_request(&profit_target_request()).await.unwrap();
    assert!(receipt.monitored());
    assert_eq!(scheduler.active_count(), 1);

    let outcome = receipt.monitor.unwrap().outcome().await.unwrap();
    assert_eq!(outcome.state, MonitorState::Filled);
    assert_eq!(outcome.exit_order_ids, vec![OrderId::new("exit-1")]);
    assert_eq!(scheduler.active_count(), 0);
}
