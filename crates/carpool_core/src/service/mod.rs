//! Carpool engine and use-case services.
//!
//! # Responsibility
//! - `assignment`: pure seat-assignment operations on one document.
//! - `reconcile`, `summary`, `schedule`: availability sync, read-only
//!   aggregates and the wall-clock resolver.
//! - `transaction`, `carpool_service`: batch application and the
//!   load → apply → persist cycle over a repository.

pub mod assignment;
pub mod carpool_service;
pub mod reconcile;
pub mod schedule;
pub mod summary;
pub mod transaction;
