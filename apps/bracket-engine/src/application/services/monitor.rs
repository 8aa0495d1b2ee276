//! Dispatch from an exit specification to the monitor that drives it.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::domain::monitoring::{MonitorOutcome, MonitorSnapshot, MonitoredOrder};
use crate::domain::order_intent::ExitSpec;
use crate::domain::shared::DomainError;

use super::bracket_monitor::BracketMonitor;
use super::monitor_context::MonitorContext;
use super::profit_target_monitor::ProfitTargetMonitor;

/// Any monitor kind.
#[derive(Debug)]
pub enum Monitor {
    /// Simple profit target.
    ProfitTarget(ProfitTargetMonitor),
    /// Bracket or confirmed stop.
    Bracket(BracketMonitor),
}

impl Monitor {
    /// Build the monitor matching the order's exit.
    ///
    /// # Errors
    ///
    /// Propagates construction errors from the chosen monitor.
    pub fn for_order(ctx: MonitorContext, order: MonitoredOrder) -> Result<Self, DomainError> {
        match *order.exit() {
            ExitSpec::ProfitTarget(spec) => {
                Ok(Self::ProfitTarget(ProfitTargetMonitor::new(ctx, order, spec)))
            }
            ExitSpec::Bracket(_) | ExitSpec::ConfirmedStop(_) => {
                BracketMonitor::new(ctx, order).map(Self::Bracket)
            }
        }
    }

    /// Receiver for the monitor's latest snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        match self {
            Self::ProfitTarget(m) => m.subscribe(),
            Self::Bracket(m) => m.subscribe(),
        }
    }

    /// Run to completion.
    pub async fn run(self, token: CancellationToken) -> MonitorOutcome {
        match self {
            Self::ProfitTarget(m) => m.run(token).await,
            Self::Bracket(m) => m.run(token).await,
        }
    }
}
