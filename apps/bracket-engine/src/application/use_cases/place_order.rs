//! Place Order Use Case
//!
//! Sends the entry order and, when the intent carries an exit, hands the
//! placed order to the scheduler.

use std::sync::Arc;

use thiserror::Error;

use crate::application::dto::PlaceOrderRequestDto;
use crate::application::ports::{BrokerError, BrokerPort, OrderRequest};
use crate::application::services::{MonitorHandle, MonitorScheduler, SchedulerError};
use crate::config::DefaultsConfig;
use crate::domain::order_intent::{OrderIntent, ValidationError};
use crate::domain::shared::OrderId;

/// Placement errors.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The request failed validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The quote needed to price a bid/ask limit entry was unavailable.
    #[error("Quote unavailable for limit price: {0}")]
    Quote(#[source] BrokerError),

    /// The broker refused the entry order; no monitor was started.
    #[error("Entry order not placed: {0}")]
    Entry(#[source] BrokerError),

    /// The entry is live at the broker but could not be monitored.
    #[error("Entry order {order_id} placed but not monitored: {source}")]
    NotMonitored {
        /// Live entry order.
        order_id: OrderId,
        /// Why registration failed.
        source: SchedulerError,
    },
}

/// Result of a successful placement.
#[derive(Debug)]
pub struct PlacementReceipt {
    /// Broker id of the entry order.
    pub order_id: OrderId,
    /// Handle to the monitor, when the intent had an exit.
    pub monitor: Option<MonitorHandle>,
}

impl PlacementReceipt {
    /// Whether a monitor was started.
    #[must_use]
    pub const fn monitored(&self) -> bool {
        self.monitor.is_some()
    }
}

/// Use case for placing an entry order and starting its monitor.
pub struct PlaceOrderUseCase {
    broker: Arc<dyn BrokerPort>,
    scheduler: Arc<MonitorScheduler>,
    defaults: DefaultsConfig,
}

impl PlaceOrderUseCase {
    /// Create a new PlaceOrderUseCase.
    #[must_use]
    pub fn new(
        broker: Arc<dyn BrokerPort>,
        scheduler: Arc<MonitorScheduler>,
        defaults: DefaultsConfig,
    ) -> Self {
        Self {
            broker,
            scheduler,
            defaults,
        }
    }

    /// Validate a raw request, resolving bid/ask limit prices, then place it.
    ///
    /// # Errors
    ///
    /// `Validation` or `Quote` before anything is sent; otherwise see [`Self::execute`].
    pub async fn execute_request(
        &self,
        request: &PlaceOrderRequestDto,
    ) -> Result<PlacementReceipt, PlacementError> {
        let quote = if request.needs_quote()? {
            let symbol = request.symbol().ok_or_else(|| ValidationError::MissingField {
                field: "symbol".to_string(),
            })?;
            Some(
                self.broker
                    .get_quote(&symbol)
                    .await
                    .map_err(PlacementError::Quote)?,
            )
        } else {
            None
        };
        let intent = request.into_intent(&self.defaults, quote.as_ref())?;
        self.execute(intent).await
    }

    /// Place the entry for a validated intent.
    ///
    /// # Errors
    ///
    /// `Entry` if the broker refuses the order, `NotMonitored` if the entry
    /// is live but its monitor could not be registered.
    pub async fn execute(&self, intent: OrderIntent) -> Result<PlacementReceipt, PlacementError> {
        let request = OrderRequest::entry(
            intent.symbol().clone(),
            intent.side(),
            intent.quantity(),
            intent.kind(),
        );

        let ack = match self.broker.place_order(request).await {
            Ok(ack) => ack,
            Err(e) => {
                tracing::warn!(
                    symbol = %intent.symbol(),
                    side = %intent.side(),
                    error = %e,
                    "Entry order rejected"
                );
                return Err(PlacementError::Entry(e));
            }
        };

        tracing::info!(
            order_id = %ack.order_id,
            symbol = %intent.symbol(),
            side = %intent.side(),
            quantity = %intent.quantity(),
            kind = %intent.kind(),
            exit = intent.exit().map_or("none", |e| e.label()),
            "Entry order placed"
        );

        if intent.exit().is_none() {
            return Ok(PlacementReceipt {
                order_id: ack.order_id,
                monitor: None,
            });
        }

        match self.scheduler.register_intent(ack.order_id.clone(), &intent) {
            Ok(handle) => Ok(PlacementReceipt {
                order_id: ack.order_id,
                monitor: Some(handle),
            }),
            Err(source) => {
                tracing::error!(
                    order_id = %ack.order_id,
                    error = %source,
                    "Entry placed but monitor registration failed"
                );
                Err(PlacementError::NotMonitored {
                    order_id: ack.order_id,
                    source,
                })
            }
        }
    }
}

impl std::fmt::Debug for PlaceOrderUseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceOrderUseCase")
            .field("scheduler", &self.scheduler)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}
