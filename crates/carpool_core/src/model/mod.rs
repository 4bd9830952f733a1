//! Domain model for per-day carpool state.
//!
//! # Responsibility
//! - Define the slot registry, the carpool document aggregate and the
//!   driver/rider profiles fed into engine calls.
//!
//! # Invariants
//! - `CarpoolDocument` is the single owned aggregate; cars and riders belong
//!   to exactly one slot (or one car within a slot) at a time.

pub mod carpool;
pub mod profile;
pub mod slot;
