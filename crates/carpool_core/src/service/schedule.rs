//! Wall-clock resolver for the carpool to show next.
//!
//! # Responsibility
//! - Pick the target date and shift from local time.
//!
//! # Invariants
//! - From `roll_over_hour` on, the target is the next day's morning.
//! - Before `afternoon_start_hour` the target is today's morning, otherwise
//!   today's afternoon.

use crate::model::slot::Shift;
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_AFTERNOON_START_HOUR: u32 = 12;
const DEFAULT_ROLL_OVER_HOUR: u32 = 18;

/// Hour boundaries used by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScheduleCutoffs {
    pub afternoon_start_hour: u32,
    pub roll_over_hour: u32,
}

impl Default for ScheduleCutoffs {
    fn default() -> Self {
        Self {
            afternoon_start_hour: DEFAULT_AFTERNOON_START_HOUR,
            roll_over_hour: DEFAULT_ROLL_OVER_HOUR,
        }
    }
}

impl ScheduleCutoffs {
    /// Checks `afternoon_start_hour < roll_over_hour <= 24`.
    pub fn validate(&self) -> Result<(), ScheduleCutoffsError> {
        if self.afternoon_start_hour >= self.roll_over_hour || self.roll_over_hour > 24 {
            return Err(ScheduleCutoffsError {
                afternoon_start_hour: self.afternoon_start_hour,
                roll_over_hour: self.roll_over_hour,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleCutoffsError {
    pub afternoon_start_hour: u32,
    pub roll_over_hour: u32,
}

impl Display for ScheduleCutoffsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid schedule cutoffs: afternoon_start_hour={} roll_over_hour={}; expected afternoon_start_hour < roll_over_hour <= 24",
            self.afternoon_start_hour, self.roll_over_hour
        )
    }
}

impl Error for ScheduleCutoffsError {}

/// Date + shift pair the UI should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarpoolTarget {
    pub date: NaiveDate,
    pub shift: Shift,
}

impl CarpoolTarget {
    /// Resolves the target for an explicit local time.
    pub fn at(now: NaiveDateTime, cutoffs: &ScheduleCutoffs) -> Self {
        Self {
            date: next_carpool_date(now, cutoffs),
            shift: next_carpool_shift(now, cutoffs),
        }
    }

    /// Resolves the target from the local wall clock.
    pub fn now(cutoffs: &ScheduleCutoffs) -> Self {
        Self::at(Local::now().naive_local(), cutoffs)
    }
}

/// Today before `roll_over_hour`, tomorrow from then on.
pub fn next_carpool_date(now: NaiveDateTime, cutoffs: &ScheduleCutoffs) -> NaiveDate {
    let today = now.date();
    if now.hour() >= cutoffs.roll_over_hour {
        // `succ_opt` only fails on NaiveDate::MAX.
        return today.succ_opt().unwrap_or(today);
    }
    today
}

/// Morning before noon, afternoon until roll-over, then next morning.
pub fn next_carpool_shift(now: NaiveDateTime, cutoffs: &ScheduleCutoffs) -> Shift {
    let hour = now.hour();
    if hour < cutoffs.afternoon_start_hour {
        Shift::Morning
    } else if hour < cutoffs.roll_over_hour {
        Shift::Afternoon
    } else {
        Shift::Morning
    }
}

#[cfg(test)]
mod tests {
    use super::{next_carpool_date, next_carpool_shift, CarpoolTarget, ScheduleCutoffs};
    use crate::model::slot::Shift;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn morning_before_noon_same_day() {
        let cutoffs = ScheduleCutoffs::default();
        let target = CarpoolTarget::at(at(7, 30), &cutoffs);
        assert_eq!(target.date, NaiveDate::from_ymd_opt(2024, 9, 2).unwrap());
        assert_eq!(target.shift, Shift::Morning);
    }

    #[test]
    fn afternoon_between_noon_and_six() {
        let cutoffs = ScheduleCutoffs::default();
        assert_eq!(next_carpool_shift(at(12, 0), &cutoffs), Shift::Afternoon);
        assert_eq!(next_carpool_shift(at(17, 59), &cutoffs), Shift::Afternoon);
        assert_eq!(
            next_carpool_date(at(17, 59), &cutoffs),
            NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
        );
    }

    #[test]
    fn rolls_to_next_morning_from_six_pm() {
        let cutoffs = ScheduleCutoffs::default();
        let target = CarpoolTarget::at(at(18, 0), &cutoffs);
        assert_eq!(target.date, NaiveDate::from_ymd_opt(2024, 9, 3).unwrap());
        assert_eq!(target.shift, Shift::Morning);
    }

    #[test]
    fn cutoffs_validate_ordering() {
        ScheduleCutoffs::default().validate().unwrap();
        let inverted = ScheduleCutoffs {
            afternoon_start_hour: 18,
            roll_over_hour: 12,
        };
        assert!(inverted.validate().is_err());
        let past_midnight = ScheduleCutoffs {
            afternoon_start_hour: 12,
            roll_over_hour: 25,
        };
        assert!(past_midnight.validate().is_err());
    }
}
