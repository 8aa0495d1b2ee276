//! Bracket Monitor
//!
//! Confirmation-gated exits with one-cancels-other legs:
//!
//! ```text
//! AwaitingEntryFill --(filled)--> AwaitingConfirmation
//! AwaitingEntryFill --(timeout)--> TimedOut | CancelFailed
//! AwaitingConfirmation --(trigger reached)--> BracketActive
//! AwaitingConfirmation --(timeout)--> ConfirmationTimedOut
//! BracketActive --(stop filled)--> Complete(stop)
//! BracketActive --(target filled)--> Complete(profit)
//! any non-terminal --(non-retryable error)--> Failed
//! any non-terminal --(released)--> Detached
//! ```
//!
//! A confirmed stop is the same flow with only the stop leg.
//!
//! A transient broker error skips the tick, including its timeout check, so
//! a timeout is never declared on a poll that could not see the market.

use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{BrokerError, OrderRequest};
use crate::domain::monitoring::{
    ExitLeg, MonitorOutcome, MonitorSnapshot, MonitorState, MonitoredOrder, StatusEvent,
};
use crate::domain::pricing::{BracketLevels, confirmation_progress, is_confirmed, per_share_pnl};
use crate::domain::shared::{DomainError, OrderId};
use crate::observability;

use super::monitor_context::MonitorContext;
use super::polling::{EntryPoll, PollTicker, cancel_once, poll_entry};

/// Monitor for a bracket or confirmed-stop exit.
#[derive(Debug)]
pub struct BracketMonitor {
    ctx: MonitorContext,
    order: MonitoredOrder,
    snapshot: watch::Sender<MonitorSnapshot>,
    fill_timeout: Duration,
    confirmation_timeout: Duration,
    exit_placement_failed: bool,
    sibling_cancel_failed: bool,
    pnl_per_share: Option<Decimal>,
}

impl BracketMonitor {
    /// Create a monitor for a confirmation-gated order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if the order's exit has no confirmation stage.
    pub fn new(ctx: MonitorContext, order: MonitoredOrder) -> Result<Self, DomainError> {
        let Some(confirmation_timeout) = order.exit().confirmation_timeout() else {
            return Err(DomainError::InvalidValue {
                field: "exit".to_string(),
                message: format!(
                    "{} exit has no confirmation stage",
                    order.exit().label()
                ),
            });
        };
        let fill_timeout = order.exit().fill_timeout();
        let (snapshot, _) = watch::channel(MonitorSnapshot::of(&order));
        Ok(Self {
            ctx,
            order,
            snapshot,
            fill_timeout,
            confirmation_timeout,
            exit_placement_failed: false,
            sibling_cancel_failed: false,
            pnl_per_share: None,
        })
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
                    "Monitoring {} {} {} {} for fill (timeout {}s)",
                    self.order.exit().label(),
                    self.order.side(),
                    self.order.quantity(),
                    self.order.symbol(),
                    self.fill_timeout.as_secs_f64()
                ),
            ))
            .await;

        let mut ticker = PollTicker::new(self.poll_interval());
        loop {
            ticker.set_period(self.poll_interval());
            if !ticker.tick(&token).await {
                return self.detach().await;
            }
            if let Some(outcome) = self.step().await {
                return outcome;
            }
        }
    }

    fn poll_interval(&self) -> Duration {
        let config = self.ctx.config();
        match self.order.state() {
            MonitorState::AwaitingConfirmation => config.confirmation_poll_interval(),
            MonitorState::BracketActive => config.bracket_poll_interval(),
            _ => config.fill_poll_interval(),
        }
    }

    async fn step(&mut self) -> Option<MonitorOutcome> {
        match self.order.state() {
            MonitorState::AwaitingEntryFill => self.poll_entry_fill().await,
            MonitorState::AwaitingConfirmation => self.poll_confirmation().await,
            MonitorState::BracketActive => self.poll_legs().await,
            _ => Some(self.outcome(format!("Monitor already finished in {}", self.order.state()))),
        }
    }

    // ------------------------------------------------------------------
    // Entry fill race
    // ------------------------------------------------------------------

    async fn poll_entry_fill(&mut self) -> Option<MonitorOutcome> {
        let elapsed = self.order.elapsed_since_start(Instant::now());
        match poll_entry(
            self.ctx.broker(),
            self.order.order_id(),
            elapsed,
            self.fill_timeout,
        )
        .await
        {
            EntryPoll::Pending => None,
            EntryPoll::Filled(price) => self.on_entry_fill(price).await,
            EntryPoll::TimedOut => Some(self.on_fill_timeout().await),
            EntryPoll::Failed(e) => Some(self.fail(&e).await),
        }
    }

    async fn on_entry_fill(&mut self, fill_price: Decimal) -> Option<MonitorOutcome> {
        if let Err(e) = self.order.record_fill(fill_price, Instant::now()) {
            tracing::error!(order_id = %self.order.order_id(), error = %e, "Fill already recorded");
        }

        let levels = BracketLevels::for_exit(
            self.order.side(),
            fill_price,
            self.order.exit(),
            self.ctx.config().stop_limit_slippage,
        );
        match levels {
            Ok(Some(levels)) => {
                self.order.set_levels(levels);
                self.enter(
                    MonitorState::AwaitingConfirmation,
                    format!(
                        "Entry filled at {fill_price}; waiting for confirmation at {} (timeout {}s)",
                        levels.trigger,
                        self.confirmation_timeout.as_secs_f64()
                    ),
                )
                .await;
                None
            }
            Ok(None) => Some(
                self.finish(
                    MonitorState::Failed,
                    format!("Entry filled at {fill_price} but the exit has no confirmation stage"),
                )
                .await,
            ),
            Err(e) => Some(
                self.finish(
                    MonitorState::Failed,
                    format!("Entry filled at {fill_price} but exit levels are invalid: {e}"),
                )
                .await,
            ),
        }
    }

    async fn on_fill_timeout(&mut self) -> MonitorOutcome {
        let entry = self.order.order_id().clone();
        let canceled = cancel_once(self.ctx.broker(), &mut self.order, &entry, "fill_timeout").await;
        let secs = self.fill_timeout.as_secs_f64();
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

    // ------------------------------------------------------------------
    // Confirmation
    // ------------------------------------------------------------------

    async fn poll_confirmation(&mut self) -> Option<MonitorOutcome> {
        let (Some(fill), Some(levels)) = (self.order.fill_price(), self.order.levels().copied())
        else {
            return Some(
                self.finish(
                    MonitorState::Failed,
                    "Confirmation stage reached without fill price or levels".to_string(),
                )
                .await,
            );
        };

        observability::record_poll("confirmation");
        match self.ctx.broker().get_quote(self.order.symbol()).await {
            Ok(quote) => {
                let side = self.order.side();
                let price = quote.price(self.ctx.config().confirmation_price_source);
                let progress = confirmation_progress(side, fill, levels.trigger, price);
                self.order.observe_price(price, progress);
                self.snapshot.send_replace(MonitorSnapshot::of(&self.order));
                tracing::debug!(
                    order_id = %self.order.order_id(),
                    price = %price,
                    trigger = %levels.trigger,
                    progress = %progress,
                    "Confirmation progress"
                );
                if is_confirmed(side, levels.trigger, price) {
                    return self.arm(levels, price).await;
                }
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    order_id = %self.order.order_id(),
                    error = %e,
                    "Transient quote error, retrying next tick"
                );
                observability::record_transient_error("get_quote", e.kind());
                return None;
            }
            Err(e) => return Some(self.fail(&e).await),
        }

        let since_fill = self.order.elapsed_since_fill(Instant::now()).unwrap_or_default();
        if since_fill >= self.confirmation_timeout {
            return Some(
                self.finish(
                    MonitorState::ConfirmationTimedOut,
                    format!(
                        "Confirmation at {} not reached within {}s; position left open, no exit orders placed",
                        levels.trigger,
                        self.confirmation_timeout.as_secs_f64()
                    ),
                )
                .await,
            );
        }
        None
    }

    /// Place the exit legs after confirmation. Stop first, so the position is
    /// never protected only by a target.
    async fn arm(&mut self, levels: BracketLevels, price: Decimal) -> Option<MonitorOutcome> {
        let symbol = self.order.symbol().clone();
        let exit_side = self.order.side().opposite();
        let quantity = self.order.quantity();

        let stop_request =
            OrderRequest::stop_limit(symbol.clone(), exit_side, quantity, levels.stop, levels.stop_limit);
        let stop_id = match self.ctx.broker().place_order(stop_request).await {
            Ok(ack) => {
                observability::record_exit_order("stop", true);
                self.order.record_exit_leg(ExitLeg::Stop, ack.order_id.clone());
                ack.order_id
            }
            Err(e) => {
                observability::record_exit_order("stop", false);
                self.exit_placement_failed = true;
                return Some(
                    self.finish(
                        MonitorState::Failed,
                        format!("Confirmed at {price} but stop placement failed: {e}; no exit orders live"),
                    )
                    .await,
                );
            }
        };

        let mut message = format!(
            "Confirmed at {price} (trigger {}); {exit_side} STOP_LIMIT {}/{} placed ({stop_id})",
            levels.trigger, levels.stop, levels.stop_limit
        );

        if let Some(target) = levels.target {
            let target_request = OrderRequest::limit(symbol, exit_side, quantity, target);
            match self.ctx.broker().place_order(target_request).await {
                Ok(ack) => {
                    observability::record_exit_order("profit", true);
                    message.push_str(&format!(", {exit_side} LIMIT {target} placed ({})", ack.order_id));
                    self.order.record_exit_leg(ExitLeg::Profit, ack.order_id);
                }
                Err(e) => {
                    observability::record_exit_order("profit", false);
                    self.exit_placement_failed = true;
                    return Some(
                        self.finish(
                            MonitorState::Failed,
                            format!(
                                "Confirmed at {price} but profit target placement failed: {e}; stop leg {stop_id} left working"
                            ),
                        )
                        .await,
                    );
                }
            }
        }

        self.enter(MonitorState::BracketActive, message).await;
        None
    }

    // ------------------------------------------------------------------
    // Exit legs
    // ------------------------------------------------------------------

    fn live_legs(&self) -> Vec<(ExitLeg, OrderId)> {
        [ExitLeg::Stop, ExitLeg::Profit]
            .into_iter()
            .filter_map(|leg| self.order.leg_order_id(leg).map(|id| (leg, id.clone())))
            .collect()
    }

    fn planned_price(&self, leg: ExitLeg) -> Option<Decimal> {
        let levels = self.order.levels()?;
        match leg {
            ExitLeg::Stop => Some(levels.stop_limit),
            ExitLeg::Profit => levels.target,
        }
    }

    async fn poll_legs(&mut self) -> Option<MonitorOutcome> {
        observability::record_poll("bracket");
        let legs = self.live_legs();
        let mut fills: Vec<(ExitLeg, Option<Decimal>)> = Vec::with_capacity(legs.len());
        let mut hard_error: Option<(ExitLeg, BrokerError)> = None;

        for (leg, id) in &legs {
            match self.ctx.broker().get_fill_status(id).await {
                Ok(status) if status.filled => {
                    fills.push((*leg, status.fill_price.or_else(|| self.planned_price(*leg))));
                }
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        order_id = %self.order.order_id(),
                        leg = %leg,
                        error = %e,
                        "Transient leg status error, retrying next tick"
                    );
                    observability::record_transient_error("get_fill_status", e.kind());
                }
                Err(e) => {
                    hard_error.get_or_insert((*leg, e));
                }
            }
        }

        if !fills.is_empty() {
            return Some(self.complete(&legs, &fills).await);
        }
        if let Some((leg, e)) = hard_error {
            return Some(
                self.finish(
                    MonitorState::Failed,
                    format!("Monitoring stopped: {leg} leg status unavailable: {e}"),
                )
                .await,
            );
        }
        None
    }

    async fn complete(
        &mut self,
        legs: &[(ExitLeg, OrderId)],
        fills: &[(ExitLeg, Option<Decimal>)],
    ) -> MonitorOutcome {
        let winner = if fills.len() > 1 {
            self.ctx.config().leg_priority.winner()
        } else {
            fills[0].0
        };
        let exit_price = fills
            .iter()
            .find(|(leg, _)| *leg == winner)
            .and_then(|(_, price)| *price);

        let mut message = match exit_price {
            Some(price) => format!("{winner} leg filled at {price}"),
            None => format!("{winner} leg filled"),
        };
        if let (Some(entry), Some(exit)) = (self.order.fill_price(), exit_price) {
            let pnl = per_share_pnl(self.order.side(), entry, exit);
            self.pnl_per_share = Some(pnl);
            message.push_str(&format!(" (P&L {pnl}/share)"));
        }

        let sibling = legs.iter().find(|(leg, _)| *leg != winner).cloned();
        if let Some((sibling_leg, sibling_id)) = sibling {
            let sibling_filled = fills.iter().any(|(leg, _)| *leg == sibling_leg);
            if sibling_filled {
                message.push_str(&format!(
                    "; {sibling_leg} leg {sibling_id} also filled in the same interval"
                ));
            } else if self.ctx.config().cancel_sibling_on_fill {
                let canceled =
                    cancel_once(self.ctx.broker(), &mut self.order, &sibling_id, "sibling").await;
                if canceled {
                    message.push_str(&format!("; {sibling_leg} leg {sibling_id} canceled"));
                } else {
                    self.sibling_cancel_failed = true;
                    message.push_str(&format!(
                        "; WARNING {sibling_leg} leg {sibling_id} cancel was not acknowledged and may still be live"
                    ));
                }
            } else {
                message.push_str(&format!(
                    "; {sibling_leg} leg {sibling_id} left to broker-side OCO and may still be live"
                ));
            }
        }

        self.finish(MonitorState::Complete(winner), message).await
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

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

    async fn enter(&mut self, state: MonitorState, message: String) {
        self.ctx
            .transition(&mut self.order, &self.snapshot, state, message)
            .await;
    }

    async fn finish(&mut self, state: MonitorState, message: String) -> MonitorOutcome {
        self.enter(state, message.clone()).await;
        self.outcome(message)
    }

    fn outcome(&self, message: String) -> MonitorOutcome {
        let mut outcome = MonitorOutcome::from_order(&self.order, message);
        outcome.exit_placement_failed = self.exit_placement_failed;
        outcome.sibling_cancel_failed = self.sibling_cancel_failed;
        outcome.pnl_per_share = self.pnl_per_share;
        outcome
    }
}
