//! Application Layer
//!
//! The application layer orchestrates domain logic. It defines:
//!
//! - **Ports**: Interfaces for the broker and status consumers
//! - **DTOs**: Loosely typed placement payloads
//! - **Services**: Per-order monitors and the scheduler
//! - **Use Cases**: Entry placement

pub mod dto;
pub mod ports;
pub mod services;
pub mod use_cases;

pub use dto::*;
pub use ports::*;
pub use services::*;
pub use use_cases::*;
