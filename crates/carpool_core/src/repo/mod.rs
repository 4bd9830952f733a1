//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the carpool document store and profile directory contracts.
//! - Isolate SQLite query details from engine/service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `CarpoolDocument::validate()` before
//!   persistence.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateDate`) in
//!   addition to DB transport errors.

pub mod carpool_repo;
pub mod directory_repo;
