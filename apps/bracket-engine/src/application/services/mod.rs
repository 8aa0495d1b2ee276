//! Application Services
//!
//! Long-running monitor tasks and the scheduler that owns them.

mod bracket_monitor;
mod monitor;
mod monitor_context;
mod polling;
mod profit_target_monitor;
mod scheduler;

pub use bracket_monitor::BracketMonitor;
pub use monitor::Monitor;
pub use monitor_context::MonitorContext;
pub use polling::{EntryPoll, PollTicker, cancel_once, poll_entry};
pub use profit_target_monitor::ProfitTargetMonitor;
pub use scheduler::{MonitorHandle, MonitorScheduler, SchedulerError};
