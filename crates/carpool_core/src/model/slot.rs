//! Fixed time-slot registry.
//!
//! # Responsibility
//! - Define the six pickup/drop-off slots and their shift grouping.
//! - Provide stable string ids used by the persisted document layout.
//!
//! # Invariants
//! - Every `TimeSlot` belongs to exactly one `Shift`.
//! - Each shift owns exactly three slots, in chronological order.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Half of the school day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    Morning,
    Afternoon,
}

/// One concrete pickup/drop-off time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "7am")]
    SevenAm,
    #[serde(rename = "8am")]
    EightAm,
    #[serde(rename = "9am")]
    NineAm,
    #[serde(rename = "1pm")]
    OnePm,
    #[serde(rename = "2pm")]
    TwoPm,
    #[serde(rename = "3pm")]
    ThreePm,
}

const MORNING_SLOTS: [TimeSlot; 3] = [TimeSlot::SevenAm, TimeSlot::EightAm, TimeSlot::NineAm];
const AFTERNOON_SLOTS: [TimeSlot; 3] = [TimeSlot::OnePm, TimeSlot::TwoPm, TimeSlot::ThreePm];

impl Shift {
    /// Both shifts in day order.
    pub const ALL: [Shift; 2] = [Shift::Morning, Shift::Afternoon];

    /// Slots owned by this shift, in chronological order.
    pub fn slots(self) -> &'static [TimeSlot; 3] {
        match self {
            Self::Morning => &MORNING_SLOTS,
            Self::Afternoon => &AFTERNOON_SLOTS,
        }
    }

    /// Stable string id used in persisted documents and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
        }
    }
}

impl TimeSlot {
    /// All six slots in chronological order.
    pub const ALL: [TimeSlot; 6] = [
        TimeSlot::SevenAm,
        TimeSlot::EightAm,
        TimeSlot::NineAm,
        TimeSlot::OnePm,
        TimeSlot::TwoPm,
        TimeSlot::ThreePm,
    ];

    /// Shift this slot belongs to.
    pub fn shift(self) -> Shift {
        match self {
            Self::SevenAm | Self::EightAm | Self::NineAm => Shift::Morning,
            Self::OnePm | Self::TwoPm | Self::ThreePm => Shift::Afternoon,
        }
    }

    /// Stable string id (`7am`, `1pm`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SevenAm => "7am",
            Self::EightAm => "8am",
            Self::NineAm => "9am",
            Self::OnePm => "1pm",
            Self::TwoPm => "2pm",
            Self::ThreePm => "3pm",
        }
    }
}

impl Display for Shift {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for TimeSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one slot id such as `8am`.
pub fn parse_time_slot(value: &str) -> Result<TimeSlot, SlotParseError> {
    let normalized = value.trim().to_ascii_lowercase();
    TimeSlot::ALL
        .into_iter()
        .find(|slot| slot.as_str() == normalized)
        .ok_or(SlotParseError::UnknownSlot(normalized))
}

/// Parses one shift id (`morning` or `afternoon`).
pub fn parse_shift(value: &str) -> Result<Shift, SlotParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "morning" => Ok(Shift::Morning),
        "afternoon" => Ok(Shift::Afternoon),
        other => Err(SlotParseError::UnknownShift(other.to_string())),
    }
}

/// Slot/shift parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotParseError {
    UnknownSlot(String),
    UnknownShift(String),
}

impl Display for SlotParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSlot(value) => write!(
                f,
                "unknown time slot `{value}`; expected 7am|8am|9am|1pm|2pm|3pm"
            ),
            Self::UnknownShift(value) => {
                write!(f, "unknown shift `{value}`; expected morning|afternoon")
            }
        }
    }
}

impl Error for SlotParseError {}
