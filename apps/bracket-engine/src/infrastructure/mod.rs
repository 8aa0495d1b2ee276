//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - `broker/`: paper (simulated market) and mock (scripted) brokers
//! - `events/`: status publishers (log, in-memory recorder)

pub mod broker;
pub mod events;
