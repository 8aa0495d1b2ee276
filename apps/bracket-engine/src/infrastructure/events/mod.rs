//! Status Publishers
//!
//! Implementations of `StatusPublisherPort`.

mod in_memory;
mod tracing;

pub use in_memory::InMemoryStatusPublisher;
pub use self::tracing::TracingStatusPublisher;
