//! Driver and rider profiles consumed by the engine.
//!
//! # Responsibility
//! - Describe the "current user" inputs passed explicitly into engine calls.
//! - Keep the persisted profile layout (`cars`, `availability`, `timetable`).
//! - Describe the school directory entries riders pick during setup.
//!
//! # Invariants
//! - The default car is the first car flagged `is_default`, else the first car.
//! - Availability is read-only input; the engine never writes it back.

use crate::model::carpool::{CarId, CarSpec};
use crate::model::slot::TimeSlot;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weekday key used by availability maps (`Sunday`..`Saturday`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayName {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl From<Weekday> for DayName {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Sun => Self::Sunday,
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
        }
    }
}

/// Slots a driver offers on one weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    #[serde(default)]
    pub morning: Vec<TimeSlot>,
    #[serde(default)]
    pub afternoon: Vec<TimeSlot>,
}

/// Weekly availability keyed by day name.
pub type WeeklyAvailability = BTreeMap<DayName, DayAvailability>;

/// One car owned by a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverCar {
    pub plate: String,
    pub seats: u32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_taxi: bool,
}

impl DriverCar {
    pub fn spec(&self) -> CarSpec {
        CarSpec {
            plate: self.plate.clone(),
            seats: self.seats,
            is_taxi: self.is_taxi,
        }
    }
}

/// Parent profile offering cars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub cars: Vec<DriverCar>,
    #[serde(default)]
    pub availability: WeeklyAvailability,
}

impl Driver {
    /// First car flagged default, else the first car.
    pub fn default_car(&self) -> Option<&DriverCar> {
        self.cars
            .iter()
            .find(|car| car.is_default)
            .or_else(|| self.cars.first())
    }

    /// Car id the default car takes when offered.
    pub fn default_car_id(&self) -> Option<CarId> {
        self.default_car()
            .map(|car| CarId::new(self.id.as_str(), car.plate.as_str()))
    }
}

/// Slot a rider usually needs per shift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    pub morning: Option<TimeSlot>,
    pub afternoon: Option<TimeSlot>,
}

/// Child profile seeking rides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderProfile {
    pub id: String,
    pub name: String,
    pub phone: String,
    /// School name as entered during setup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default)]
    pub timetable: Timetable,
}

/// Directory entry for a school riders attend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub grades: Vec<u8>,
}

impl School {
    /// Case-insensitive match where every space-separated word of `term`
    /// occurs in the name. An empty term matches every school.
    pub fn matches(&self, term: &str) -> bool {
        let name = self.name.to_lowercase();
        term.to_lowercase()
            .split(' ')
            .all(|word| name.contains(word))
    }
}
