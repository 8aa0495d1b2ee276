//! Profit Target Monitor
//!
//! Drives a single entry order to a terminal state:
//!
//! ```text
//! AwaitingFill --(filled)--> Filled            (exit LIMIT placed)
//! AwaitingFill --(timeout)--> TimedOut | CancelFailed
//! AwaitingFill --(unknown order)--> Failed
//! AwaitingFill --(released)--> Detached
//! ```

use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{BrokerError, OrderRequest};
use crate::domain::monitoring::{
    ExitLeg, MonitorOutcome, MonitorSnapshot, MonitorState, MonitoredOrder, StatusEvent,
};
use crate::domain::order_intent::ProfitTarget;
use crate::domain::pricing::{LegKind, leg_price};
use crate::observability;

use super::monitor_context::MonitorContext;
use super::polling::{EntryPoll, PollTicker, cancel_once, poll_entry};

/// Monitor for an entry order with a simple profit target.
#[derive(Debug)]
pub struct ProfitTargetMonitor {
    ctx: MonitorContext,
    order: MonitoredOrder,
    spec: ProfitTarget,
    snapshot: watch::Sender<MonitorSnapshot>,
    exit_placement_failed: bool,
}

impl ProfitTargetMonitor {
    /// Create a monitor for `order`, which must carry `spec` as its exit.
    #[must_use]
    pub fn new(ctx: MonitorContext, order: MonitoredOrder, spec: ProfitTarget) -> Self {
        let (snapshot, _) = watch::channel(MonitorSnapshot::of(&order));
        Self {
            ctx,
            order,
            spec,
            snapshot,
            exit_placement_failed: false,
        }
    }

    /// Receiver for the monitor's latest snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshot.subscribe()
    }

    /// Poll until a terminal state is reached or `token` is cancelled.
    pub async fn run(mut self, token: CancellationToken) -> MonitorOutcome {
        self.ctx
            .publish(StatusEvent::from_order(
                &self.order,
                format!(
                    "Monitoring {} {} {} for fill (timeout {}s, target {})",
                    self.order.side(),
                    self.order.quantity(),
                    self.order.symbol(),
                    self.spec.fill_timeout.as_secs_f64(),
                    self.spec.offset
                ),
            ))
            .await;

        let mut ticker = PollTicker::new(self.ctx.config().fill_poll_interval());
        loop {
            if !ticker.tick(&token).await {
                return self.detach().await;
            }
            if let Some(outcome) = self.step().await {
                return outcome;
            }
        }
    }

    async fn step(&mut self) -> Option<MonitorOutcome> {
        let elapsed = self.order.elapsed_since_start(Instant::now());
        let poll = poll_entry(
            self.ctx.broker(),
            self.order.order_id(),
            elapsed,
            self.spec.fill_timeout,
        )
        .await;

        match poll {
            EntryPoll::Pending => None,
            EntryPoll::Filled(price) => Some(self.on_fill(price).await),
            EntryPoll::TimedOut => Some(self.on_timeout().await),
            EntryPoll::Failed(e) => Some(self.fail(&e).await),
        }
    }

    async fn on_fill(&mut self, fill_price: Decimal) -> MonitorOutcome {
        if let Err(e) = self.order.record_fill(fill_price, Instant::now()) {
            tracing::error!(order_id = %self.order.order_id(), error = %e, "Fill already recorded");
        }

        let side = self.order.side();
        let exit_price = leg_price(side, LegKind::ProfitTarget, fill_price, self.spec.offset);
        let message = if exit_price <= Decimal::ZERO {
            self.exit_placement_failed = true;
            observability::record_exit_order("profit", false);
            format!(
                "Entry filled at {fill_price}; profit target {exit_price} is not a valid price, no exit placed"
            )
        } else {
            let request = OrderRequest::limit(
                self.order.symbol().clone(),
                side.opposite(),
                self.order.quantity(),
                exit_price,
            );
            match self.ctx.broker().place_order(request).await {
                Ok(ack) => {
                    observability::record_exit_order("profit", true);
                    let message = format!(
                        "Entry filled at {fill_price}; {} LIMIT {exit_price} placed ({})",
                        side.opposite(),
                        ack.order_id
                    );
                    self.order.record_exit_leg(ExitLeg::Profit, ack.order_id);
                    message
                }
                Err(e) => {
                    self.exit_placement_failed = true;
                    observability::record_exit_order("profit", false);
                    tracing::error!(
                        order_id = %self.order.order_id(),
                        error = %e,
                        "Profit target placement failed"
                    );
                    format!("Entry filled at {fill_price}; profit target placement failed: {e}")
                }
            }
        };

        self.finish(MonitorState::Filled, message).await
    }

    async fn on_timeout(&mut self) -> MonitorOutcome {
        let entry = self.order.order_id().clone();
        let canceled = cancel_once(self.ctx.broker(), &mut self.order, &entry, "fill_timeout").await;
        let secs = self.spec.fill_timeout.as_secs_f64();
        if canceled {
            self.finish(
                MonitorState::TimedOut,
                format!("Not filled within {secs}s; entry canceled"),
            )
            .await
        } else {
            self.finish(
                MonitorState::CancelFailed,
                format!("Not filled within {secs}s; cancel was not acknowledged"),
            )
            .await
        }
    }

    async fn fail(&mut self, error: &BrokerError) -> MonitorOutcome {
        self.finish(MonitorState::Failed, format!("Monitoring stopped: {error}"))
            .await
    }

    async fn detach(mut self) -> MonitorOutcome {
        self.finish(
            MonitorState::Detached,
            "Tracking released; broker orders left untouched".to_string(),
        )
        .await
    }

    async fn finish(&mut self, state: MonitorState, message: String) -> MonitorOutcome {
        self.ctx
            .transition(&mut self.order, &self.snapshot, state, message.clone())
            .await;
        let mut outcome = MonitorOutcome::from_order(&self.order, message);
        outcome.exit_placement_failed = self.exit_placement_failed;
        outcome
    }
}
