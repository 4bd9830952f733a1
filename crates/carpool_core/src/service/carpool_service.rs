//! Carpool use-case service.
//!
//! # Responsibility
//! - Run the load → apply → persist cycle around engine operations.
//! - Provide the driver/rider use cases (offer toggle, join, leave).
//!
//! # Invariants
//! - Each call is one load/persist cycle by one actor. Cycles of different
//!   actors are not serialized; the last persisted document wins.
//! - Unchanged documents are not written back.
//! - A failed join is never persisted.

use crate::model::carpool::{CarId, CarpoolDocument, Rider};
use crate::model::profile::Driver;
use crate::model::slot::{Shift, TimeSlot};
use crate::repo::carpool_repo::{CarpoolRepository, RepoError, StoredCarpool};
use crate::service::assignment::{assign_rider, unassign_rider, AssignOutcome, EngineError};
use crate::service::transaction::{apply_operations, Applied, CarpoolOp, OpOutcome};
use chrono::NaiveDate;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from carpool use cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed engine call.
    Engine(EngineError),
    /// Storage failure; the mutation is not durably applied.
    Repo(RepoError),
    /// Driver has no car to offer.
    NoCars(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::NoCars(driver_id) => write!(f, "driver {driver_id} has no cars to offer"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NoCars(_) => None,
        }
    }
}

impl From<EngineError> for ServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of one load → apply → persist cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transacted {
    pub carpool: StoredCarpool,
    pub outcomes: Vec<OpOutcome>,
    /// Whether the document was written back.
    pub persisted: bool,
}

/// What `toggle_driver_car` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarToggle {
    Offered(CarId),
    Withdrawn(CarId),
}

/// Use-case service over a carpool repository.
pub struct CarpoolService<R: CarpoolRepository> {
    repo: R,
}

impl<R: CarpoolRepository> CarpoolService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads the document for `date`, creating an empty one when absent.
    pub fn get_or_create(&self, date: NaiveDate) -> ServiceResult<StoredCarpool> {
        if let Some(stored) = self.repo.load_by_date(date)? {
            return Ok(stored);
        }

        let document = CarpoolDocument::empty(date);
        let id = self.repo.create(&document)?;
        info!(
            "event=carpool_created module=service status=ok carpool_id={id} date={}",
            document.date_key()
        );
        Ok(StoredCarpool { id, document })
    }

    /// Applies `ops` to the document for `date` and persists it when changed.
    ///
    /// # Errors
    /// - `ServiceError::Engine` for malformed operations; nothing is persisted.
    /// - `ServiceError::Repo` when loading or persisting fails.
    pub fn transact(&self, date: NaiveDate, ops: &[CarpoolOp]) -> ServiceResult<Transacted> {
        let stored = self.get_or_create(date)?;
        let applied = apply_operations(&stored.document, ops)?;
        self.commit(stored, applied, true)
    }

    /// Loads the document for `date` with the driver's availability applied.
    pub fn load_for_driver(&self, date: NaiveDate, driver: &Driver) -> ServiceResult<Transacted> {
        self.transact(
            date,
            &[CarpoolOp::ReconcileDriver {
                driver: driver.clone(),
            }],
        )
    }

    /// Withdraws the driver's default car from one slot, or offers it when it
    /// is not there yet.
    ///
    /// # Errors
    /// - `ServiceError::NoCars` when the driver owns no car.
    pub fn toggle_driver_car(
        &self,
        date: NaiveDate,
        driver: &Driver,
        slot: TimeSlot,
        shift: Shift,
    ) -> ServiceResult<CarToggle> {
        let (car, car_id) = driver
            .default_car()
            .zip(driver.default_car_id())
            .ok_or_else(|| ServiceError::NoCars(driver.id.clone()))?;

        let stored = self.get_or_create(date)?;
        let offered = stored
            .document
            .slot(shift, slot)
            .is_some_and(|state| state.has_car(&car_id));

        let (op, toggle) = if offered {
            (
                CarpoolOp::RemoveCar {
                    car_id: car_id.clone(),
                    slot,
                    shift,
                },
                CarToggle::Withdrawn(car_id),
            )
        } else {
            (
                CarpoolOp::AddCar {
                    driver_id: driver.id.clone(),
                    driver_name: driver.name.clone(),
                    spec: car.spec(),
                    slot,
                    shift,
                },
                CarToggle::Offered(car_id),
            )
        };

        let applied = apply_operations(&stored.document, &[op])?;
        self.commit(stored, applied, true)?;
        Ok(toggle)
    }

    /// Moves a rider into the requested car of one slot.
    ///
    /// The rider is first removed from wherever they sit in the slot. When the
    /// requested car is full or missing, nothing is persisted and the rider
    /// keeps their previous place.
    pub fn join_car(
        &self,
        date: NaiveDate,
        rider: &Rider,
        slot: TimeSlot,
        shift: Shift,
        car_id: &CarId,
    ) -> ServiceResult<AssignOutcome> {
        let stored = self.get_or_create(date)?;
        let mut next = stored.document.clone();
        unassign_rider(&mut next, &rider.id, slot, shift)?;
        let outcome = assign_rider(&mut next, &rider.id, &rider.name, slot, shift, Some(car_id))?;

        let applied = Applied {
            changed: next != stored.document,
            document: next,
            outcomes: vec![
                OpOutcome::RiderUnassigned,
                OpOutcome::RiderAssigned(outcome.clone()),
            ],
        };
        self.commit(stored, applied, outcome.success)?;
        Ok(outcome)
    }

    /// Removes a rider from one slot entirely.
    pub fn leave_slot(
        &self,
        date: NaiveDate,
        rider_id: &str,
        slot: TimeSlot,
        shift: Shift,
    ) -> ServiceResult<()> {
        self.transact(
            date,
            &[CarpoolOp::UnassignRider {
                rider_id: rider_id.to_string(),
                slot,
                shift,
            }],
        )?;
        Ok(())
    }

    /// Flags a car as possibly not driving. Returns `false` when absent.
    pub fn flag_car_unavailable(
        &self,
        date: NaiveDate,
        car_id: &CarId,
        slot: TimeSlot,
        shift: Shift,
    ) -> ServiceResult<bool> {
        let done = self.transact(
            date,
            &[CarpoolOp::MarkCarUnavailable {
                car_id: car_id.clone(),
                slot,
                shift,
            }],
        )?;
        Ok(matches!(
            done.outcomes.first(),
            Some(OpOutcome::CarMarkedUnavailable { found: true })
        ))
    }

    fn commit(
        &self,
        stored: StoredCarpool,
        applied: Applied,
        accept: bool,
    ) -> ServiceResult<Transacted> {
        if !(accept && applied.changed) {
            return Ok(Transacted {
                carpool: stored,
                outcomes: applied.outcomes,
                persisted: false,
            });
        }

        if let Err(err) = self.repo.update(stored.id, &applied.document) {
            warn!(
                "event=carpool_persist module=service status=error carpool_id={} error={err}",
                stored.id
            );
            return Err(err.into());
        }
        info!(
            "event=carpool_persist module=service status=ok carpool_id={} date={} ops={}",
            stored.id,
            applied.document.date_key(),
            applied.outcomes.len()
        );

        Ok(Transacted {
            carpool: StoredCarpool {
                id: stored.id,
                document: applied.document,
            },
            outcomes: applied.outcomes,
            persisted: true,
        })
    }
}
