//! Price Calculator
//!
//! Pure functions turning a fill price and offset specification into
//! trigger, stop and target prices. No state, no I/O.

mod levels;
mod offset_price;
mod progress;

pub use levels::BracketLevels;
pub use offset_price::{
    LegKind, PriceDirection, compute_offset_price, leg_direction, leg_price, round_to_cent,
};
pub use progress::{confirmation_progress, is_confirmed, per_share_pnl};
