//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod identifiers;
mod quantity;
mod symbol;

pub use identifiers::OrderId;
pub use quantity::Quantity;
pub use symbol::Symbol;
