//! Status publisher that writes each event to the log.

use async_trait::async_trait;

use crate::application::ports::{StatusPublishError, StatusPublisherPort};
use crate::domain::monitoring::StatusEvent;

/// Logs status events at `info` with structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatusPublisher;

#[async_trait]
impl StatusPublisherPort for TracingStatusPublisher {
    async fn publish(&self, event: StatusEvent) -> Result<(), StatusPublishError> {
        tracing::info!(
            target: "bracket_engine::status",
            order_id = %event.order_id,
            symbol = %event.symbol,
            side = %event.side,
            quantity = %event.quantity,
            state = event.state_tag(),
            fill_price = ?event.fill_price,
            trigger_price = ?event.trigger_price,
            stop_order_id = ?event.stop_order_id.as_ref().map(|id| id.as_str()),
            profit_order_id = ?event.profit_order_id.as_ref().map(|id| id.as_str()),
            "{}",
            event.message
        );
        Ok(())
    }
}
