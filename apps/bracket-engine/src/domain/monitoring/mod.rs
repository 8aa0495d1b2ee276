//! Monitoring Bounded Context
//!
//! Lifecycle state of monitored orders: the state enum, its transition
//! table, the `MonitoredOrder` entity and the events it produces.

pub mod events;
pub mod monitored_order;
pub mod state;
pub mod state_machine;

pub use events::{MonitorOutcome, MonitorSnapshot, StatusEvent};
pub use monitored_order::MonitoredOrder;
pub use state::{ExitLeg, MonitorState};
pub use state_machine::MonitorStateMachine;
