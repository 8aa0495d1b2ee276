//! Status Publisher Port (Driven Port)
//!
//! Where monitors report their lifecycle transitions.

use async_trait::async_trait;

use crate::domain::monitoring::StatusEvent;

/// Status publishing error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StatusPublishError {
    /// No subscriber is listening.
    #[error("No status subscribers")]
    NoSubscribers,

    /// Serialization error.
    #[error("Status serialization error: {message}")]
    SerializationError {
        /// Error details.
        message: String,
    },

    /// Publishing failed.
    #[error("Status publish failed: {message}")]
    PublishFailed {
        /// Error details.
        message: String,
    },
}

/// Port for publishing status events.
///
/// Publishing is best-effort: monitors log failures and carry on.
#[async_trait]
pub trait StatusPublisherPort: Send + Sync {
    /// Publish a single status event.
    async fn publish(&self, event: StatusEvent) -> Result<(), StatusPublishError>;
}

/// No-op publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct NoOpStatusPublisher;

#[async_trait]
impl StatusPublisherPort for NoOpStatusPublisher {
    async fn publish(&self, _event: StatusEvent) -> Result<(), StatusPublishError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::monitoring::MonitoredOrder;
    use crate::domain::order_intent::{ExitSpec, Offset, OrderSide, ProfitTarget};
    use crate::domain::shared::{OrderId, Quantity, Symbol};
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test]
    async fn no_op_publisher_succeeds() {
        let order = MonitoredOrder::new(
            OrderId::new("order-1"),
            Symbol::new("AAPL"),
            OrderSide::Buy,
            Quantity::new(100).unwrap(),
            ExitSpec::ProfitTarget(
                ProfitTarget::new(Offset::dollar(dec!(1)).unwrap(), Duration::from_secs(15))
                    .unwrap(),
            ),
            Instant::now(),
        );
        let result = NoOpStatusPublisher
            .publish(StatusEvent::from_order(&order, "monitoring"))
            .await;
        assert!(result.is_ok());
    }
}
