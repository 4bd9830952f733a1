//! Seat-assignment engine.
//!
//! # Responsibility
//! - Add, withdraw and flag cars within one slot.
//! - Place riders into cars with strict preferred-car and first-fit rules.
//! - Append withdrawal notifications when capacity is lost.
//!
//! # Invariants
//! - No operation pushes a car past `seat_count`.
//! - No operation inserts a rider into a car or the unassigned list that
//!   already holds that rider id.
//! - Capacity and not-found conditions are outcomes, never errors.
//! - The engine performs no I/O.

use crate::model::carpool::{
    Car, CarId, CarSpec, CarpoolDocument, Notification, NotificationKind, Rider, SlotState,
};
use crate::model::slot::{Shift, TimeSlot};
use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type EngineResult<T> = Result<T, EngineError>;

/// Malformed engine calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The addressed slot is not part of the addressed shift.
    SlotShiftMismatch { shift: Shift, slot: TimeSlot },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SlotShiftMismatch { shift, slot } => {
                write!(f, "slot {slot} is not part of the {shift} shift")
            }
        }
    }
}

impl Error for EngineError {}

/// Why an assignment attempt ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignReason {
    AssignedToRequestedCar,
    CarFull,
    CarNotFound,
    AutoAssigned,
    NoAvailableCars,
}

impl AssignReason {
    /// User-facing reason text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AssignedToRequestedCar => "Assigned to requested car",
            Self::CarFull => "Car is full",
            Self::CarNotFound => "Car not found",
            Self::AutoAssigned => "Auto-assigned",
            Self::NoAvailableCars => "No available cars",
        }
    }
}

impl Display for AssignReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `assign_rider`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignOutcome {
    pub success: bool,
    /// Car the rider sits in after the call, when successful.
    pub car_id: Option<CarId>,
    pub reason: AssignReason,
}

impl AssignOutcome {
    fn placed(car_id: CarId, reason: AssignReason) -> Self {
        Self {
            success: true,
            car_id: Some(car_id),
            reason,
        }
    }

    fn rejected(reason: AssignReason) -> Self {
        Self {
            success: false,
            car_id: None,
            reason,
        }
    }
}

/// Offers a car into one slot and returns its id.
///
/// Re-offering an existing car id replaces it in place with a fresh,
/// available car with no riders. Callers that want to keep riders must
/// re-assign them.
///
/// # Errors
/// - `EngineError::SlotShiftMismatch` when `slot` is not part of `shift`.
pub fn add_car(
    doc: &mut CarpoolDocument,
    driver_id: &str,
    driver_name: &str,
    spec: &CarSpec,
    slot: TimeSlot,
    shift: Shift,
) -> EngineResult<CarId> {
    let state = slot_state_mut(doc, shift, slot)?;
    let car_id = CarId::new(driver_id, spec.plate.as_str());
    let car = Car::new(car_id.clone(), driver_name, spec.seats, spec.is_taxi);

    match state.cars.iter().position(|existing| existing.id == car_id) {
        Some(index) => {
            state.cars[index] = car;
            debug!(
                "event=car_offered module=engine status=replaced car_id={car_id} shift={shift} slot={slot}"
            );
        }
        None => {
            state.cars.push(car);
            debug!(
                "event=car_offered module=engine status=added car_id={car_id} shift={shift} slot={slot}"
            );
        }
    }

    Ok(car_id)
}

/// Withdraws a car from one slot. Returns `false` when the car is absent.
///
/// Displaced riders move to the unassigned list, and a `car_withdrawn`
/// notification is appended when at least one rider was displaced.
///
/// # Errors
/// - `EngineError::SlotShiftMismatch` when `slot` is not part of `shift`.
pub fn remove_car(
    doc: &mut CarpoolDocument,
    car_id: &CarId,
    slot: TimeSlot,
    shift: Shift,
) -> EngineResult<bool> {
    let state = slot_state_mut(doc, shift, slot)?;
    let Some(index) = state.cars.iter().position(|car| &car.id == car_id) else {
        return Ok(false);
    };

    let car = state.cars.remove(index);
    let displaced = car.assigned_riders.len();
    let rider_names = join_rider_names(&car.assigned_riders);
    for rider in car.assigned_riders {
        push_unassigned(state, rider);
    }

    if displaced > 0 {
        doc.notifications.push(new_notification(
            NotificationKind::CarWithdrawn,
            format!(
                "{} withdrew their car. Kids need new rides: {rider_names}",
                car.driver_name
            ),
        ));
    }

    info!(
        "event=car_withdrawn module=engine status=ok car_id={car_id} shift={shift} slot={slot} displaced={displaced}"
    );
    Ok(true)
}

/// Places a rider into a car of one slot.
///
/// Selection order:
/// 1. `preferred` given: that car only. Full or missing fails without
///    falling through to other cars. A car already holding the rider
///    succeeds even when full, and is left unchanged.
/// 2. Otherwise the first car that is available and has a free seat.
/// 3. Otherwise the rider is parked in the unassigned list (once).
///
/// The engine does not look for the rider in other cars of the slot;
/// moving a rider means `unassign_rider` first.
///
/// # Errors
/// - `EngineError::SlotShiftMismatch` when `slot` is not part of `shift`.
pub fn assign_rider(
    doc: &mut CarpoolDocument,
    rider_id: &str,
    rider_name: &str,
    slot: TimeSlot,
    shift: Shift,
    preferred: Option<&CarId>,
) -> EngineResult<AssignOutcome> {
    let state = slot_state_mut(doc, shift, slot)?;
    let rider = Rider::new(rider_id, rider_name);

    let outcome = match preferred {
        Some(car_id) => match state.find_car_mut(car_id) {
            Some(car) if car.has_rider(rider_id) => {
                AssignOutcome::placed(car.id.clone(), AssignReason::AssignedToRequestedCar)
            }
            Some(car) if car.has_free_seat() => {
                car.assigned_riders.push(rider);
                AssignOutcome::placed(car.id.clone(), AssignReason::AssignedToRequestedCar)
            }
            Some(_) => AssignOutcome::rejected(AssignReason::CarFull),
            None => AssignOutcome::rejected(AssignReason::CarNotFound),
        },
        None => {
            let candidate = state
                .cars
                .iter_mut()
                .find(|car| car.is_available && car.has_free_seat());
            match candidate {
                Some(car) => {
                    if !car.has_rider(rider_id) {
                        car.assigned_riders.push(rider);
                    }
                    AssignOutcome::placed(car.id.clone(), AssignReason::AutoAssigned)
                }
                None => {
                    push_unassigned(state, rider);
                    AssignOutcome::rejected(AssignReason::NoAvailableCars)
                }
            }
        }
    };

    debug!(
        "event=rider_assign module=engine status={} rider_id={rider_id} shift={shift} slot={slot} car_id={} reason=\"{}\"",
        if outcome.success { "ok" } else { "rejected" },
        outcome
            .car_id
            .as_ref()
            .map_or_else(|| "none".to_string(), ToString::to_string),
        outcome.reason
    );
    Ok(outcome)
}

/// Removes a rider from every car and from the unassigned list of one slot.
///
/// No-op when the rider is not present.
///
/// # Errors
/// - `EngineError::SlotShiftMismatch` when `slot` is not part of `shift`.
pub fn unassign_rider(
    doc: &mut CarpoolDocument,
    rider_id: &str,
    slot: TimeSlot,
    shift: Shift,
) -> EngineResult<()> {
    let state = slot_state_mut(doc, shift, slot)?;
    for car in &mut state.cars {
        car.assigned_riders.retain(|rider| rider.id != rider_id);
    }
    state.unassigned_riders.retain(|rider| rider.id != rider_id);

    debug!("event=rider_unassign module=engine status=ok rider_id={rider_id} shift={shift} slot={slot}");
    Ok(())
}

/// Flags a car as possibly not driving. Returns `false` when the car is absent.
///
/// The car and its riders stay in place; a `car_unavailable` notification is
/// appended when riders are affected.
///
/// # Errors
/// - `EngineError::SlotShiftMismatch` when `slot` is not part of `shift`.
pub fn mark_car_unavailable(
    doc: &mut CarpoolDocument,
    car_id: &CarId,
    slot: TimeSlot,
    shift: Shift,
) -> EngineResult<bool> {
    let state = slot_state_mut(doc, shift, slot)?;
    let Some(car) = state.find_car_mut(car_id) else {
        return Ok(false);
    };

    car.is_available = false;
    let affected = car.assigned_riders.len();
    if affected > 0 {
        let message = format!(
            "{} is requesting to withdraw. Kids need new rides: {}",
            car.driver_name,
            join_rider_names(&car.assigned_riders)
        );
        doc.notifications
            .push(new_notification(NotificationKind::CarUnavailable, message));
    }

    info!(
        "event=car_unavailable module=engine status=ok car_id={car_id} shift={shift} slot={slot} affected={affected}"
    );
    Ok(true)
}

/// Retries first-fit placement for every unassigned rider of one slot.
///
/// Returns how many riders remain unassigned. Riders keep their relative
/// order in the unassigned list.
///
/// # Errors
/// - `EngineError::SlotShiftMismatch` when `slot` is not part of `shift`.
pub fn auto_assign_unassigned(
    doc: &mut CarpoolDocument,
    slot: TimeSlot,
    shift: Shift,
) -> EngineResult<usize> {
    let waiting = std::mem::take(&mut slot_state_mut(doc, shift, slot)?.unassigned_riders);
    let total = waiting.len();

    for rider in waiting {
        assign_rider(doc, &rider.id, &rider.name, slot, shift, None)?;
    }

    let remaining = slot_state_mut(doc, shift, slot)?.unassigned_riders.len();
    info!(
        "event=auto_assign module=engine status=ok shift={shift} slot={slot} placed={} remaining={remaining}",
        total - remaining
    );
    Ok(remaining)
}

pub(crate) fn slot_state_mut(
    doc: &mut CarpoolDocument,
    shift: Shift,
    slot: TimeSlot,
) -> EngineResult<&mut SlotState> {
    doc.slot_mut(shift, slot)
        .ok_or(EngineError::SlotShiftMismatch { shift, slot })
}

fn push_unassigned(state: &mut SlotState, rider: Rider) {
    if !state.is_unassigned(&rider.id) {
        state.unassigned_riders.push(rider);
    }
}

fn join_rider_names(riders: &[Rider]) -> String {
    riders
        .iter()
        .map(|rider| rider.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn new_notification(kind: NotificationKind, message: String) -> Notification {
    Notification {
        id: Uuid::new_v4().to_string(),
        kind,
        message,
        timestamp_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}
