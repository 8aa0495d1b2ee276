//! Order Intent Value Objects

mod exit_spec;
mod offset;
mod order_intent;
mod order_kind;
mod order_side;

pub use exit_spec::{BracketSpec, ConfirmedStopSpec, ExitSpec, ProfitTarget};
pub use offset::{Offset, OffsetKind};
pub use order_intent::OrderIntent;
pub use order_kind::OrderKind;
pub use order_side::OrderSide;
