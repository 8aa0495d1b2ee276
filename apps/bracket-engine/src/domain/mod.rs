//! Domain Layer
//!
//! Pure business logic with no I/O. Bounded contexts:
//!
//! - `shared`: identifiers, symbols, quantities, domain errors
//! - `order_intent`: what the trader asked for, validated once at intake
//! - `pricing`: the price calculator
//! - `monitoring`: per-order lifecycle state and status events

pub mod monitoring;
pub mod order_intent;
pub mod pricing;
pub mod shared;
