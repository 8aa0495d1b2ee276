//! Order Intent Bounded Context
//!
//! What the trader asked for: the entry order and its exit behaviour.
//! Everything here is validated once at intake and immutable afterwards.

pub mod errors;
pub mod value_objects;

pub use errors::ValidationError;
pub use value_objects::{
    BracketSpec, ConfirmedStopSpec, ExitSpec, Offset, OffsetKind, OrderIntent, OrderKind,
    OrderSide, ProfitTarget,
};
