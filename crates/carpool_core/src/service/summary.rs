//! Read-only seat and slot summaries.
//!
//! Summaries are recomputed on every call and never cached.

use crate::model::carpool::{Car, CarpoolDocument, SlotState};
use crate::model::slot::{Shift, TimeSlot};
use serde::Serialize;

/// Aggregate counts for one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSummary {
    pub total_cars: usize,
    /// Cars with `is_available == true`.
    pub available_cars: usize,
    /// Summed in `u64`.
    pub total_seats: u64,
    pub occupied_seats: usize,
    pub unassigned_count: usize,
}

/// Free seats left in one car.
///
/// Saturates at zero for documents loaded with more riders than seats.
pub fn seats_available(car: &Car) -> u32 {
    let occupied = u32::try_from(car.assigned_riders.len()).unwrap_or(u32::MAX);
    car.seat_count.saturating_sub(occupied)
}

/// Summarizes one slot; a slot outside `shift` or absent summarizes as empty.
pub fn slot_summary(doc: &CarpoolDocument, shift: Shift, slot: TimeSlot) -> SlotSummary {
    doc.slot(shift, slot)
        .map(summarize_state)
        .unwrap_or_default()
}

fn summarize_state(state: &SlotState) -> SlotSummary {
    SlotSummary {
        total_cars: state.cars.len(),
        available_cars: state.cars.iter().filter(|car| car.is_available).count(),
        total_seats: state
            .cars
            .iter()
            .map(|car| u64::from(car.seat_count))
            .sum(),
        occupied_seats: state
            .cars
            .iter()
            .map(|car| car.assigned_riders.len())
            .sum(),
        unassigned_count: state.unassigned_riders.len(),
    }
}
