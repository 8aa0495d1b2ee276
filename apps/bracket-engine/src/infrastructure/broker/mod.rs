//! Broker Adapters
//!
//! Implementations of `BrokerPort`.

mod mock;
mod paper;

pub use mock::{FillPlan, MockBroker};
pub use paper::PaperBroker;
