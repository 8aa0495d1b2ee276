//! Application Ports (Hexagonal Architecture)
//!
//! Driven ports the engine needs from the outside world.

mod broker_port;
mod status_publisher_port;

pub use broker_port::{
    BrokerError, BrokerPort, CancelAck, FillStatus, OrderAck, OrderRequest, OrderType,
    PriceSource, Quote, TimeInForce,
};
pub use status_publisher_port::{NoOpStatusPublisher, StatusPublishError, StatusPublisherPort};
