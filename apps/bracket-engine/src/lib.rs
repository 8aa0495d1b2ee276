// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::panic
    )
)]

//! Bracket Engine - conditional order automation
//!
//! Places an entry order, watches it fill, and then manages exit orders
//! that depend on the fill: a simple profit target, a confirmation-gated
//! bracket (stop-loss and profit target, one cancels the other), or a
//! confirmation-gated single stop.
//!
//! # Architecture (Clean Architecture + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Pure business logic
//!   - `order_intent`: validated entry + exit instructions
//!   - `pricing`: offset prices, confirmation progress, exit levels
//!   - `monitoring`: monitor lifecycle states, transition table, status events
//!
//! - **Application**: Orchestration
//!   - `ports`: `BrokerPort`, `StatusPublisherPort`
//!   - `dto`: loosely typed placement payloads
//!   - `services`: per-order monitors and the `MonitorScheduler`
//!   - `use_cases`: `PlaceOrderUseCase`
//!
//! - **Infrastructure**: Adapters
//!   - `broker`: `PaperBroker` (simulated market), `MockBroker` (scripted)
//!   - `events`: log and in-memory status publishers
//!
//! Every monitored order runs as its own tokio task with its own timer. Tasks
//! share only the broker port and the status publisher.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Ports, services and use cases.
pub mod application;

/// Infrastructure layer - Adapters.
pub mod infrastructure;

/// YAML configuration.
pub mod config;

/// Crate-level errors.
pub mod error;

/// Prometheus metrics.
pub mod observability;

/// Tracing subscriber setup.
pub mod telemetry;

pub use application::dto::PlaceOrderRequestDto;
pub use application::ports::{BrokerError, BrokerPort, StatusPublisherPort};
pub use application::services::{MonitorHandle, MonitorScheduler, SchedulerError};
pub use application::use_cases::{PlaceOrderUseCase, PlacementError, PlacementReceipt};
pub use domain::monitoring::{MonitorOutcome, MonitorSnapshot, MonitorState, StatusEvent};
pub use domain::order_intent::{ExitSpec, OrderIntent, ValidationError};
pub use error::{EngineError, ErrorCode};
