//! Collaborators shared by every monitor task.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::application::ports::{BrokerPort, StatusPublisherPort};
use crate::config::MonitoringConfig;
use crate::domain::monitoring::{
    MonitorSnapshot, MonitorState, MonitorStateMachine, MonitoredOrder, StatusEvent,
};

/// Broker, publisher and policy handed to each monitor.
///
/// Cheap to clone; monitors share nothing mutable through it.
#[derive(Clone)]
pub struct MonitorContext {
    broker: Arc<dyn BrokerPort>,
    publisher: Arc<dyn StatusPublisherPort>,
    config: Arc<MonitoringConfig>,
    events: Option<broadcast::Sender<StatusEvent>>,
}

impl MonitorContext {
    /// Create a context without an event fan-out channel.
    #[must_use]
    pub fn new(
        broker: Arc<dyn BrokerPort>,
        publisher: Arc<dyn StatusPublisherPort>,
        config: MonitoringConfig,
    ) -> Self {
        Self {
            broker,
            publisher,
            config: Arc::new(config),
            events: None,
        }
    }

    /// Also send every status event to `events`.
    #[must_use]
    pub fn with_event_channel(mut self, events: broadcast::Sender<StatusEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Broker port.
    #[must_use]
    pub fn broker(&self) -> &dyn BrokerPort {
        self.broker.as_ref()
    }

    /// Monitoring policy.
    #[must_use]
    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    /// Publish one status event. Failures are logged, never propagated.
    pub async fn publish(&self, event: StatusEvent) {
        if let Some(events) = &self.events {
            // No subscribers is fine.
            let _ = events.send(event.clone());
        }
        if let Err(e) = self.publisher.publish(event).await {
            tracing::warn!(error = %e, "Failed to publish status event");
        }
    }

    /// Validate and apply a transition, then publish it and refresh the snapshot.
    ///
    /// An illegal transition is logged and leaves the order unchanged.
    pub async fn transition(
        &self,
        order: &mut MonitoredOrder,
        snapshot: &watch::Sender<MonitorSnapshot>,
        to: MonitorState,
        message: String,
    ) {
        let from = order.state();
        if let Err(e) = order.transition_to(to) {
            tracing::error!(
                order_id = %order.order_id(),
                error = %e,
                allowed = ?MonitorStateMachine::valid_next_states(from),
                "Rejected monitor transition"
            );
            return;
        }

        tracing::info!(
            order_id = %order.order_id(),
            symbol = %order.symbol(),
            from = %from,
            to = %to,
            "{message}"
        );

        snapshot.send_replace(MonitorSnapshot::of(order));
        self.publish(StatusEvent::from_order(order, message)).await;
    }
}

impl std::fmt::Debug for MonitorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorContext")
            .field("config", &self.config)
            .field("fan_out", &self.events.is_some())
            .finish_non_exhaustive()
    }
}
