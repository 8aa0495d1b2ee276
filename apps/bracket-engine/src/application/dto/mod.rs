//! Data Transfer Objects (DTOs)
//!
//! Placement payloads at the engine's input boundary.

mod placement_dto;

pub use placement_dto::{ExitRequestDto, LimitPriceSource, PlaceOrderRequestDto};
