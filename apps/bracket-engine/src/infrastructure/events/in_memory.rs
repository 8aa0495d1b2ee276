//! In-memory status publisher for tests and embedding.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{StatusPublishError, StatusPublisherPort};
use crate::domain::monitoring::{MonitorState, StatusEvent};
use crate::domain::shared::OrderId;

/// Records every published status event in order.
#[derive(Debug, Default)]
pub struct InMemoryStatusPublisher {
    events: RwLock<Vec<StatusEvent>>,
}

impl InMemoryStatusPublisher {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events so far.
    #[must_use]
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.read().clone()
    }

    /// Events for one entry order.
    #[must_use]
    pub fn events_for(&self, order_id: &OrderId) -> Vec<StatusEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| &e.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Sequence of states reported for one entry order.
    #[must_use]
    pub fn states_for(&self, order_id: &OrderId) -> Vec<MonitorState> {
        self.events_for(order_id).iter().map(|e| e.state).collect()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[async_trait]
impl StatusPublisherPort for InMemoryStatusPublisher {
    async fn publish(&self, event: StatusEvent) -> Result<(), StatusPublishError> {
        self.events.write().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::monitoring::MonitoredOrder;
    use crate::domain::order_intent::{ExitSpec, Offset, OrderSide, ProfitTarget};
    use crate::domain::shared::{Quantity, Symbol};
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio::time::Instant;

    fn order(id: &str) -> MonitoredOrder {
        MonitoredOrder::new(
            OrderId::new(id),
            Symbol::new("AAPL"),
            OrderSide::Buy,
            Quantity::new(1).unwrap(),
            ExitSpec::ProfitTarget(
                ProfitTarget::new(Offset::dollar(dec!(1)).unwrap(), Duration::from_secs(15))
                    .unwrap(),
            ),
            Instant::now(),
        )
    }

    #[test]
    fn records_per_order() {
        let publisher = InMemoryStatusPublisher::new();
        tokio_test::block_on(async {
            publisher
                .publish(StatusEvent::from_order(&order("a"), "one"))
                .await
                .unwrap();
            publisher
                .publish(StatusEvent::from_order(&order("b"), "two"))
                .await
                .unwrap();
        });

        assert_eq!(publisher.len(), 2);
        assert_eq!(
            publisher.states_for(&OrderId::new("a")),
            vec![MonitorState::AwaitingFill]
        );
        assert_eq!(publisher.events_for(&OrderId::new("b"))[0].message, "two");
    }
}
