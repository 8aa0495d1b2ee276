//! Polling primitives shared by the monitors.
//!
//! - [`PollTicker`]: drift-free interval that yields to a cancellation token
//! - [`poll_entry`]: one round of the entry fill/timeout race
//! - [`cancel_once`]: at-most-once cancel through the order's claim set

use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{BrokerError, BrokerPort};
use crate::domain::monitoring::MonitoredOrder;
use crate::domain::shared::OrderId;
use crate::observability;

/// Periodic tick that can be interrupted by a cancellation token.
///
/// The first tick fires one full period after creation. Slow ticks delay the
/// schedule rather than bursting to catch up.
#[derive(Debug)]
pub struct PollTicker {
    interval: Interval,
    period: Duration,
}

impl PollTicker {
    /// Start ticking every `period`.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            interval: Self::build(period),
            period,
        }
    }

    fn build(period: Duration) -> Interval {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }

    /// Current period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Change the period; the next tick is one new period from now.
    pub fn set_period(&mut self, period: Duration) {
        if period != self.period {
            self.interval = Self::build(period);
            self.period = period;
        }
    }

    /// Wait for the next tick.
    ///
    /// Returns false if `token` was cancelled first.
    pub async fn tick(&mut self, token: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            () = token.cancelled() => false,
            _ = self.interval.tick() => true,
        }
    }
}

/// Result of one entry poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoll {
    /// The entry filled at this price.
    Filled(Decimal),
    /// Not filled and the fill timeout has elapsed.
    TimedOut,
    /// Not filled yet, or status unknown this tick.
    Pending,
    /// Non-retryable broker error.
    Failed(BrokerError),
}

/// Query the entry fill status, then (only if unfilled) evaluate the timeout.
///
/// A fill observed in the same tick as the timeout wins. A transient query
/// error skips the timeout check: the order may have filled, so it must not
/// be canceled on a guess.
pub async fn poll_entry(
    broker: &dyn BrokerPort,
    order_id: &OrderId,
    elapsed: Duration,
    timeout: Duration,
) -> EntryPoll {
    observability::record_poll("fill");
    match broker.get_fill_status(order_id).await {
        Ok(status) if status.filled => match status.fill_price {
            Some(price) => EntryPoll::Filled(price),
            None => EntryPoll::Failed(BrokerError::Unknown {
                message: format!("order {order_id} reported filled without a fill price"),
            }),
        },
        Ok(_) if elapsed >= timeout => EntryPoll::TimedOut,
        Ok(_) => EntryPoll::Pending,
        Err(e) if e.is_transient() => {
            tracing::warn!(
                order_id = %order_id,
                error = %e,
                "Transient fill status error, retrying next tick"
            );
            observability::record_transient_error("get_fill_status", e.kind());
            EntryPoll::Pending
        }
        Err(e) => EntryPoll::Failed(e),
    }
}

/// Issue at most one cancel for `target` over the order's lifetime.
///
/// Returns true only if the broker acknowledged the cancel. A repeated call
/// for the same target returns false without contacting the broker.
pub async fn cancel_once(
    broker: &dyn BrokerPort,
    order: &mut MonitoredOrder,
    target: &OrderId,
    reason: &'static str,
) -> bool {
    if !order.claim_cancel(target) {
        tracing::warn!(
            order_id = %order.order_id(),
            target = %target,
            "Cancel already issued, not repeating"
        );
        return false;
    }

    let success = match broker.cancel_order(target).await {
        Ok(ack) => ack.success,
        Err(e) => {
            tracing::warn!(
                order_id = %order.order_id(),
                target = %target,
                error = %e,
                "Cancel request failed"
            );
            false
        }
    };
    observability::record_cancel(reason, success);
    success
}
