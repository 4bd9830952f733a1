//! Core seat-assignment and carpool-state engine.
//! This crate is the single source of truth for seat and slot invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod phone;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::carpool::{
    Car, CarId, CarSpec, CarpoolDocument, DocumentValidationError, Notification,
    NotificationKind, Rider, SlotState,
};
pub use model::profile::{
    DayAvailability, DayName, Driver, DriverCar, RiderProfile, School, Timetable,
    WeeklyAvailability,
};
pub use model::slot::{parse_shift, parse_time_slot, Shift, SlotParseError, TimeSlot};
pub use phone::{format_phone_number, validate_phone_number, PhoneError};
pub use repo::carpool_repo::{
    CarpoolId, CarpoolRepository, RepoError, RepoResult, SqliteCarpoolRepository, StoredCarpool,
};
pub use repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
pub use service::assignment::{
    add_car, assign_rider, auto_assign_unassigned, mark_car_unavailable, remove_car,
    unassign_rider, AssignOutcome, AssignReason, EngineError, EngineResult,
};
pub use service::carpool_service::{
    CarToggle, CarpoolService, ServiceError, ServiceResult, Transacted,
};
pub use service::reconcile::reconcile_driver_availability;
pub use service::schedule::{
    next_carpool_date, next_carpool_shift, CarpoolTarget, ScheduleCutoffs, ScheduleCutoffsError,
};
pub use service::summary::{seats_available, slot_summary, SlotSummary};
pub use service::transaction::{apply_operations, Applied, CarpoolOp, OpOutcome};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
