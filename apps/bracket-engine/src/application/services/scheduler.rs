//! Monitor Scheduler
//!
//! Owns every running monitor. Each registration gets its own tokio task,
//! its own timer and its own child cancellation token; monitors share only
//! the broker port and the status publisher.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::application::ports::{BrokerPort, StatusPublisherPort};
use crate::config::MonitoringConfig;
use crate::domain::monitoring::{
    MonitorOutcome, MonitorSnapshot, MonitorState, MonitoredOrder, StatusEvent,
};
use crate::domain::order_intent::OrderIntent;
use crate::domain::shared::{DomainError, OrderId};
use crate::observability;

use super::monitor::Monitor;
use super::monitor_context::MonitorContext;

/// Scheduler errors.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A monitor for this entry order is already registered.
    #[error("order {order_id} is already monitored")]
    AlreadyMonitored {
        /// Entry order id.
        order_id: OrderId,
    },

    /// The intent carries no exit specification.
    #[error("order {order_id} has no exit specification to monitor")]
    NothingToMonitor {
        /// Entry order id.
        order_id: OrderId,
    },

    /// The scheduler is shutting down.
    #[error("scheduler is shutting down")]
    ShuttingDown,

    /// The monitoring settings cannot drive a monitor.
    #[error("invalid monitoring config: {0}")]
    InvalidConfig(String),

    /// The monitor could not be built for this order.
    #[error("cannot monitor order: {0}")]
    InvalidMonitor(#[from] DomainError),

    /// The monitor task ended without reporting an outcome.
    #[error("monitor for order {order_id} ended without an outcome")]
    OutcomeLost {
        /// Entry order id.
        order_id: OrderId,
    },
}

/// Handle to a registered monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    order_id: OrderId,
    outcome: oneshot::Receiver<MonitorOutcome>,
}

impl MonitorHandle {
    /// Entry order id.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Wait for the monitor's final outcome.
    ///
    /// # Errors
    ///
    /// Returns `OutcomeLost` if the monitor task was aborted.
    pub async fn outcome(self) -> Result<MonitorOutcome, SchedulerError> {
        self.outcome.await.map_err(|_| SchedulerError::OutcomeLost {
            order_id: self.order_id,
        })
    }
}

struct Registration {
    token: CancellationToken,
    snapshot: watch::Receiver<MonitorSnapshot>,
}

type Registry = Arc<Mutex<HashMap<OrderId, Registration>>>;

/// Removes a monitor's registry entry when its task ends, including by panic.
struct Deregistration {
    order_id: OrderId,
    registry: Registry,
    active: Arc<watch::Sender<usize>>,
}

impl Drop for Deregistration {
    fn drop(&mut self) {
        let mut registry = self.registry.lock();
        registry.remove(&self.order_id);
        self.active.send_replace(registry.len());
        observability::update_active_monitors(registry.len());
    }
}

/// Runs any number of independent monitors.
pub struct MonitorScheduler {
    ctx: MonitorContext,
    events: broadcast::Sender<StatusEvent>,
    registry: Registry,
    active: Arc<watch::Sender<usize>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl MonitorScheduler {
    /// Create a scheduler. Cancelling `shutdown` releases every monitor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `config` fails validation.
    pub fn new(
        broker: Arc<dyn BrokerPort>,
        publisher: Arc<dyn StatusPublisherPort>,
        config: MonitoringConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        let (events, _) = broadcast::channel(config.event_channel_capacity);
        let ctx = MonitorContext::new(broker, publisher, config).with_event_channel(events.clone());
        let (active, _) = watch::channel(0);
        Ok(Self {
            ctx,
            events,
            registry: Arc::new(Mutex::new(HashMap::new())),
            active: Arc::new(active),
            shutdown,
            tracker: TaskTracker::new(),
        })
    }

    /// Start monitoring an order.
    ///
    /// # Errors
    ///
    /// Rejects a second registration for the same entry order id, and any
    /// registration after shutdown.
    pub fn register(&self, order: MonitoredOrder) -> Result<MonitorHandle, SchedulerError> {
        if self.shutdown.is_cancelled() {
            return Err(SchedulerError::ShuttingDown);
        }

        let order_id = order.order_id().clone();
        let strategy = order.exit().label();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let token = self.shutdown.child_token();

        {
            let mut registry = self.registry.lock();
            if registry.contains_key(&order_id) {
                return Err(SchedulerError::AlreadyMonitored { order_id });
            }
            let monitor = Monitor::for_order(self.ctx.clone(), order)?;
            registry.insert(
                order_id.clone(),
                Registration {
                    token: token.clone(),
                    snapshot: monitor.subscribe(),
                },
            );
            self.active.send_replace(registry.len());
            observability::update_active_monitors(registry.len());

            let deregistration = Deregistration {
                order_id: order_id.clone(),
                registry: Arc::clone(&self.registry),
                active: Arc::clone(&self.active),
            };
            let task_order_id = order_id.clone();
            self.tracker.spawn(async move {
                let started = Instant::now();
                let outcome = monitor.run(token).await;
                drop(deregistration);

                observability::record_monitor_outcome(strategy, outcome.state.tag());
                observability::record_monitor_lifetime(strategy, started.elapsed().as_secs_f64());
                tracing::debug!(
                    order_id = %task_order_id,
                    state = %outcome.state,
                    "Monitor deregistered"
                );
                // The handle may have been dropped.
                let _ = outcome_tx.send(outcome);
            });
        }

        tracing::info!(order_id = %order_id, strategy, "Monitor registered");
        Ok(MonitorHandle {
            order_id,
            outcome: outcome_rx,
        })
    }

    /// Start monitoring a placed entry order for `intent`'s exit.
    ///
    /// # Errors
    ///
    /// `NothingToMonitor` when the intent has no exit; otherwise see [`Self::register`].
    pub fn register_intent(
        &self,
        order_id: OrderId,
        intent: &OrderIntent,
    ) -> Result<MonitorHandle, SchedulerError> {
        let Some(exit) = intent.exit() else {
            return Err(SchedulerError::NothingToMonitor { order_id });
        };
        self.register(MonitoredOrder::new(
            order_id,
            intent.symbol().clone(),
            intent.side(),
            intent.quantity(),
            *exit,
            Instant::now(),
        ))
    }

    /// Stop tracking an order at its next tick. Broker orders are untouched.
    ///
    /// Returns false if the order is not monitored.
    pub fn release(&self, order_id: &OrderId) -> bool {
        let registry = self.registry.lock();
        match registry.get(order_id) {
            Some(registration) => {
                registration.token.cancel();
                tracing::info!(order_id = %order_id, "Monitor release requested");
                true
            }
            None => false,
        }
    }

    /// Release every monitor and wait for their tasks to finish.
    pub async fn shutdown(&self) {
        tracing::info!(active = self.active_count(), "Releasing all monitors");
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Latest snapshot of one monitor.
    #[must_use]
    pub fn snapshot(&self, order_id: &OrderId) -> Option<MonitorSnapshot> {
        self.registry
            .lock()
            .get(order_id)
            .map(|r| r.snapshot.borrow().clone())
    }

    /// Latest snapshots of every monitor.
    #[must_use]
    pub fn snapshots(&self) -> Vec<MonitorSnapshot> {
        self.registry
            .lock()
            .values()
            .map(|r| r.snapshot.borrow().clone())
            .collect()
    }

    /// Snapshots of monitors currently in `state`.
    #[must_use]
    pub fn snapshots_in_state(&self, state: MonitorState) -> Vec<MonitorSnapshot> {
        self.snapshots()
            .into_iter()
            .filter(|s| s.state == state)
            .collect()
    }

    /// Number of registered monitors.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Receive every status event from every monitor.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    /// Resolve once no monitor is registered.
    pub async fn wait_idle(&self) {
        let mut active = self.active.subscribe();
        // The sender lives in `self`, so this only errors if it is dropped.
        let _ = active.wait_for(|count| *count == 0).await;
    }
}

impl std::fmt::Debug for MonitorScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorScheduler")
            .field("active", &self.active_count())
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}
