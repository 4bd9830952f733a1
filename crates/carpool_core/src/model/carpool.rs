//! Per-day carpool document model.
//!
//! # Responsibility
//! - Define the canonical aggregate mutated by the assignment engine.
//! - Own the persisted JSON layout (`unassignedKids`, `assignedKids`, ...).
//!
//! # Invariants
//! - `len(car.assigned_riders) <= car.seat_count` for every car.
//! - A rider id appears at most once per slot, either in one car or in
//!   `unassigned_riders`.
//! - A car id is derived from driver id + plate and never stored apart from
//!   them.
//! - Notifications are append-only.

use crate::model::slot::{Shift, TimeSlot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A child seeking a seat. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rider {
    pub id: String,
    pub name: String,
}

impl Rider {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Composite car identity: one driver offering one plate.
///
/// The string form `driver_id-plate` is what the persisted layout carries;
/// comparisons use both parts, so ids stay distinct even when a plate
/// contains `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CarId {
    driver_id: String,
    plate: String,
}

impl CarId {
    pub fn new(driver_id: impl Into<String>, plate: impl Into<String>) -> Self {
        Self {
            driver_id: driver_id.into(),
            plate: plate.into(),
        }
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    pub fn plate(&self) -> &str {
        &self.plate
    }
}

impl Display for CarId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.driver_id, self.plate)
    }
}

/// Car attributes offered by a driver for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarSpec {
    pub plate: String,
    pub seats: u32,
    pub is_taxi: bool,
}

impl CarSpec {
    pub fn new(plate: impl Into<String>, seats: u32) -> Self {
        Self {
            plate: plate.into(),
            seats,
            is_taxi: false,
        }
    }
}

/// A car offered into one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "CarRecord", try_from = "CarRecord")]
pub struct Car {
    pub id: CarId,
    pub driver_name: String,
    /// Must be >= 1; checked by `CarpoolDocument::validate`.
    pub seat_count: u32,
    pub assigned_riders: Vec<Rider>,
    /// `false` once the driver flagged a possible withdrawal.
    pub is_available: bool,
    pub is_taxi: bool,
}

impl Car {
    /// Creates an available car with no riders.
    pub fn new(id: CarId, driver_name: impl Into<String>, seats: u32, is_taxi: bool) -> Self {
        Self {
            id,
            driver_name: driver_name.into(),
            seat_count: seats,
            assigned_riders: Vec::new(),
            is_available: true,
            is_taxi,
        }
    }

    pub fn plate(&self) -> &str {
        self.id.plate()
    }

    pub fn has_free_seat(&self) -> bool {
        self.assigned_riders.len() < self.seat_count as usize
    }

    pub fn has_rider(&self, rider_id: &str) -> bool {
        self.assigned_riders.iter().any(|rider| rider.id == rider_id)
    }
}

/// Persisted car shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CarRecord {
    id: String,
    parent_id: String,
    parent_name: String,
    plate: String,
    seats: u32,
    assigned_kids: Vec<Rider>,
    is_available: bool,
    #[serde(default)]
    is_taxi: bool,
}

impl From<Car> for CarRecord {
    fn from(car: Car) -> Self {
        Self {
            id: car.id.to_string(),
            parent_id: car.id.driver_id,
            parent_name: car.driver_name,
            plate: car.id.plate,
            seats: car.seat_count,
            assigned_kids: car.assigned_riders,
            is_available: car.is_available,
            is_taxi: car.is_taxi,
        }
    }
}

impl TryFrom<CarRecord> for Car {
    type Error = String;

    fn try_from(record: CarRecord) -> Result<Self, Self::Error> {
        let id = CarId::new(record.parent_id, record.plate);
        if id.to_string() != record.id {
            return Err(format!(
                "car id `{}` does not match parentId/plate `{id}`",
                record.id
            ));
        }
        Ok(Self {
            id,
            driver_name: record.parent_name,
            seat_count: record.seats,
            assigned_riders: record.assigned_kids,
            is_available: record.is_available,
            is_taxi: record.is_taxi,
        })
    }
}

/// Cars and waiting riders for one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotState {
    pub cars: Vec<Car>,
    #[serde(rename = "unassignedKids")]
    pub unassigned_riders: Vec<Rider>,
}

impl SlotState {
    pub fn find_car(&self, car_id: &CarId) -> Option<&Car> {
        self.cars.iter().find(|car| &car.id == car_id)
    }

    pub fn find_car_mut(&mut self, car_id: &CarId) -> Option<&mut Car> {
        self.cars.iter_mut().find(|car| &car.id == car_id)
    }

    pub fn has_car(&self, car_id: &CarId) -> bool {
        self.find_car(car_id).is_some()
    }

    pub fn is_unassigned(&self, rider_id: &str) -> bool {
        self.unassigned_riders
            .iter()
            .any(|rider| rider.id == rider_id)
    }

    /// Returns the car currently holding `rider_id`, if any.
    pub fn car_of_rider(&self, rider_id: &str) -> Option<&Car> {
        self.cars.iter().find(|car| car.has_rider(rider_id))
    }
}

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A car carrying riders was removed from a slot.
    CarWithdrawn,
    /// A car carrying riders was flagged as possibly not driving.
    CarUnavailable,
}

/// Entry of the append-only notification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    /// RFC 3339 / ISO-8601 UTC timestamp.
    #[serde(rename = "timestamp")]
    pub timestamp_iso: String,
}

/// Canonical state of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarpoolDocument {
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub morning: BTreeMap<TimeSlot, SlotState>,
    pub afternoon: BTreeMap<TimeSlot, SlotState>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl CarpoolDocument {
    /// Creates a document with all six slots empty.
    pub fn empty(date: NaiveDate) -> Self {
        let empty_shift = |shift: Shift| {
            shift
                .slots()
                .iter()
                .map(|slot| (*slot, SlotState::default()))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            date,
            morning: empty_shift(Shift::Morning),
            afternoon: empty_shift(Shift::Afternoon),
            notifications: Vec::new(),
        }
    }

    /// Document date in persisted `YYYY-MM-DD` form.
    pub fn date_key(&self) -> String {
        format_date_key(self.date)
    }

    pub fn shift(&self, shift: Shift) -> &BTreeMap<TimeSlot, SlotState> {
        match shift {
            Shift::Morning => &self.morning,
            Shift::Afternoon => &self.afternoon,
        }
    }

    /// Returns one slot state when `slot` belongs to `shift` and is present.
    pub fn slot(&self, shift: Shift, slot: TimeSlot) -> Option<&SlotState> {
        if slot.shift() != shift {
            return None;
        }
        self.shift(shift).get(&slot)
    }

    /// Returns one slot state for mutation, creating it empty when missing.
    ///
    /// Returns `None` when `slot` does not belong to `shift`.
    pub fn slot_mut(&mut self, shift: Shift, slot: TimeSlot) -> Option<&mut SlotState> {
        if slot.shift() != shift {
            return None;
        }
        let slots = match shift {
            Shift::Morning => &mut self.morning,
            Shift::Afternoon => &mut self.afternoon,
        };
        Some(slots.entry(slot).or_default())
    }

    /// Checks structural and seat invariants of the whole document.
    ///
    /// # Errors
    /// - Returns the first violated invariant found, scanning shifts and slots
    ///   in day order.
    pub fn validate(&self) -> Result<(), DocumentValidationError> {
        for shift in Shift::ALL {
            let slots = self.shift(shift);
            for slot in slots.keys() {
                if slot.shift() != shift {
                    return Err(DocumentValidationError::SlotOutsideShift {
                        shift,
                        slot: *slot,
                    });
                }
            }

            for slot in shift.slots() {
                let state = slots
                    .get(slot)
                    .ok_or(DocumentValidationError::MissingSlot {
                        shift,
                        slot: *slot,
                    })?;
                validate_slot(*slot, state)?;
            }
        }
        Ok(())
    }
}

fn validate_slot(slot: TimeSlot, state: &SlotState) -> Result<(), DocumentValidationError> {
    let mut car_ids = HashSet::new();
    let mut rider_ids = HashSet::new();

    for car in &state.cars {
        if !car_ids.insert(&car.id) {
            return Err(DocumentValidationError::DuplicateCar {
                slot,
                car_id: car.id.to_string(),
            });
        }
        if car.seat_count == 0 {
            return Err(DocumentValidationError::ZeroSeats {
                slot,
                car_id: car.id.to_string(),
            });
        }
        if car.assigned_riders.len() > car.seat_count as usize {
            return Err(DocumentValidationError::OverCapacity {
                slot,
                car_id: car.id.to_string(),
                seats: car.seat_count,
                assigned: car.assigned_riders.len(),
            });
        }
        for rider in &car.assigned_riders {
            if !rider_ids.insert(rider.id.as_str()) {
                return Err(DocumentValidationError::DuplicateRider {
                    slot,
                    rider_id: rider.id.clone(),
                });
            }
        }
    }

    for rider in &state.unassigned_riders {
        if !rider_ids.insert(rider.id.as_str()) {
            return Err(DocumentValidationError::DuplicateRider {
                slot,
                rider_id: rider.id.clone(),
            });
        }
    }

    Ok(())
}

/// Formats a date as the persisted document key.
pub fn format_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Invariant violations detected by `CarpoolDocument::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValidationError {
    MissingSlot {
        shift: Shift,
        slot: TimeSlot,
    },
    SlotOutsideShift {
        shift: Shift,
        slot: TimeSlot,
    },
    DuplicateCar {
        slot: TimeSlot,
        car_id: String,
    },
    ZeroSeats {
        slot: TimeSlot,
        car_id: String,
    },
    OverCapacity {
        slot: TimeSlot,
        car_id: String,
        seats: u32,
        assigned: usize,
    },
    DuplicateRider {
        slot: TimeSlot,
        rider_id: String,
    },
}

impl Display for DocumentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSlot { shift, slot } => {
                write!(f, "document is missing slot {shift}/{slot}")
            }
            Self::SlotOutsideShift { shift, slot } => {
                write!(f, "slot {slot} is not part of the {shift} shift")
            }
            Self::DuplicateCar { slot, car_id } => {
                write!(f, "car {car_id} appears twice in slot {slot}")
            }
            Self::ZeroSeats { slot, car_id } => {
                write!(f, "car {car_id} in slot {slot} has no seats")
            }
            Self::OverCapacity {
                slot,
                car_id,
                seats,
                assigned,
            } => write!(
                f,
                "car {car_id} in slot {slot} carries {assigned} riders for {seats} seats"
            ),
            Self::DuplicateRider { slot, rider_id } => {
                write!(f, "rider {rider_id} appears more than once in slot {slot}")
            }
        }
    }
}

impl Error for DocumentValidationError {}

#[cfg(test)]
mod tests {
    use super::{Car, CarId, CarpoolDocument, DocumentValidationError, Rider};
    use crate::model::slot::{Shift, TimeSlot};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    #[test]
    fn empty_document_has_all_six_slots_and_validates() {
        let doc = CarpoolDocument::empty(date());
        assert_eq!(doc.morning.len(), 3);
        assert_eq!(doc.afternoon.len(), 3);
        assert!(doc.notifications.is_empty());
        doc.validate().unwrap();
    }

    #[test]
    fn slot_lookup_rejects_foreign_shift() {
        let mut doc = CarpoolDocument::empty(date());
        assert!(doc.slot(Shift::Morning, TimeSlot::OnePm).is_none());
        assert!(doc.slot_mut(Shift::Afternoon, TimeSlot::SevenAm).is_none());
        assert!(doc.slot(Shift::Afternoon, TimeSlot::OnePm).is_some());
    }

    #[test]
    fn car_id_string_form_joins_driver_and_plate() {
        let id = CarId::new("P1", "ABC-123");
        assert_eq!(id.to_string(), "P1-ABC-123");
        assert_ne!(id, CarId::new("P1-ABC", "123"));
        assert_eq!(id.driver_id(), "P1");
        assert_eq!(id.plate(), "ABC-123");
    }

    #[test]
    fn validate_reports_over_capacity_and_duplicates() {
        let mut doc = CarpoolDocument::empty(date());
        let slot = doc.slot_mut(Shift::Morning, TimeSlot::EightAm).unwrap();
        let mut car = Car::new(CarId::new("P1", "X"), "Parent A", 1, false);
        car.assigned_riders.push(Rider::new("K1", "Kid1"));
        car.assigned_riders.push(Rider::new("K2", "Kid2"));
        slot.cars.push(car);

        let err = doc.validate().unwrap_err();
        assert!(matches!(err, DocumentValidationError::OverCapacity { assigned: 2, .. }));

        let slot = doc.slot_mut(Shift::Morning, TimeSlot::EightAm).unwrap();
        slot.cars[0].seat_count = 4;
        slot.unassigned_riders.push(Rider::new("K1", "Kid1"));
        let err = doc.validate().unwrap_err();
        assert_eq!(
            err,
            DocumentValidationError::DuplicateRider {
                slot: TimeSlot::EightAm,
                rider_id: "K1".to_string(),
            }
        );
    }

    #[test]
    fn validate_reports_missing_slot() {
        let mut doc = CarpoolDocument::empty(date());
        doc.afternoon.remove(&TimeSlot::TwoPm);
        assert_eq!(
            doc.validate().unwrap_err(),
            DocumentValidationError::MissingSlot {
                shift: Shift::Afternoon,
                slot: TimeSlot::TwoPm,
            }
        );
    }

    #[test]
    fn json_layout_matches_persisted_shape() {
        let mut doc = CarpoolDocument::empty(date());
        let slot = doc.slot_mut(Shift::Morning, TimeSlot::EightAm).unwrap();
        let mut car = Car::new(CarId::new("P1", "X"), "Parent A", 2, true);
        car.assigned_riders.push(Rider::new("K1", "Kid1"));
        slot.cars.push(car);
        slot.unassigned_riders.push(Rider::new("K2", "Kid2"));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["date"], "2024-09-02");
        let car = &value["morning"]["8am"]["cars"][0];
        assert_eq!(car["id"], "P1-X");
        assert_eq!(car["parentId"], "P1");
        assert_eq!(car["parentName"], "Parent A");
        assert_eq!(car["plate"], "X");
        assert_eq!(car["seats"], 2);
        assert_eq!(car["assignedKids"][0]["name"], "Kid1");
        assert_eq!(car["isAvailable"], true);
        assert_eq!(car["isTaxi"], true);
        assert_eq!(value["morning"]["8am"]["unassignedKids"][0]["id"], "K2");
        assert!(value["afternoon"]["3pm"]["cars"].as_array().unwrap().is_empty());

        let back: CarpoolDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn deserialize_rejects_inconsistent_car_id() {
        let raw = serde_json::json!({
            "id": "P2-X",
            "parentId": "P1",
            "parentName": "Parent A",
            "plate": "X",
            "seats": 2,
            "assignedKids": [],
            "isAvailable": true,
            "isTaxi": false
        });
        assert!(serde_json::from_value::<Car>(raw).is_err());
    }
}
