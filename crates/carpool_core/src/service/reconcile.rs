//! Auto-offer reconciler for declared driver availability.
//!
//! # Responsibility
//! - Make sure a driver's default car sits in every slot the driver declared
//!   for the document's weekday.
//!
//! # Invariants
//! - Presence is checked by car id before adding, so a second run adds
//!   nothing and never clears riders of an already offered car.
//! - Slots are handled independently; morning slots first, then afternoon.

use crate::model::carpool::CarpoolDocument;
use crate::model::profile::{DayName, Driver};
use crate::model::slot::{Shift, TimeSlot};
use crate::service::assignment::{add_car, slot_state_mut, EngineResult};
use chrono::Datelike;
use log::{debug, warn};

/// Offers the driver's default car into every available slot of the day.
///
/// Returns the number of cars added. Drivers without cars or without an
/// availability entry for the weekday add nothing. Slots listed under the
/// wrong shift are skipped.
///
/// # Errors
/// - Propagates engine errors; none are expected for in-shift slots.
pub fn reconcile_driver_availability(
    doc: &mut CarpoolDocument,
    driver: &Driver,
) -> EngineResult<usize> {
    let Some((car, car_id)) = driver.default_car().zip(driver.default_car_id()) else {
        debug!(
            "event=reconcile module=reconciler status=skipped reason=no_cars driver_id={}",
            driver.id
        );
        return Ok(0);
    };
    let day = DayName::from(doc.date.weekday());
    let Some(availability) = driver.availability.get(&day) else {
        debug!(
            "event=reconcile module=reconciler status=skipped reason=no_availability driver_id={} day={day:?}",
            driver.id
        );
        return Ok(0);
    };

    let spec = car.spec();
    let wanted = availability
        .morning
        .iter()
        .map(|slot| (Shift::Morning, *slot))
        .chain(
            availability
                .afternoon
                .iter()
                .map(|slot| (Shift::Afternoon, *slot)),
        )
        .collect::<Vec<(Shift, TimeSlot)>>();

    let mut added = 0;
    for (shift, slot) in wanted {
        if slot.shift() != shift {
            warn!(
                "event=reconcile module=reconciler status=skipped reason=slot_outside_shift driver_id={} shift={shift} slot={slot}",
                driver.id
            );
            continue;
        }
        if slot_state_mut(doc, shift, slot)?.has_car(&car_id) {
            continue;
        }
        add_car(doc, &driver.id, &driver.name, &spec, slot, shift)?;
        added += 1;
    }

    debug!(
        "event=reconcile module=reconciler status=ok driver_id={} car_id={car_id} added={added}",
        driver.id
    );
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::reconcile_driver_availability;
    use crate::model::carpool::CarpoolDocument;
    use crate::model::profile::{DayAvailability, DayName, Driver, DriverCar};
    use crate::model::slot::{Shift, TimeSlot};
    use chrono::NaiveDate;

    fn monday_doc() -> CarpoolDocument {
        CarpoolDocument::empty(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap())
    }

    fn driver_with(availability: DayAvailability) -> Driver {
        Driver {
            id: "P1".to_string(),
            name: "Parent A".to_string(),
            phone: "+972501234567".to_string(),
            cars: vec![DriverCar {
                plate: "X".to_string(),
                seats: 3,
                is_default: true,
                is_taxi: false,
            }],
            availability: [(DayName::Monday, availability)].into_iter().collect(),
        }
    }

    #[test]
    fn slots_listed_under_wrong_shift_are_skipped() {
        let mut doc = monday_doc();
        let driver = driver_with(DayAvailability {
            morning: vec![TimeSlot::OnePm, TimeSlot::SevenAm],
            afternoon: Vec::new(),
        });

        let added = reconcile_driver_availability(&mut doc, &driver).unwrap();
        assert_eq!(added, 1);
        assert_eq!(
            doc.slot(Shift::Morning, TimeSlot::SevenAm).unwrap().cars.len(),
            1
        );
        assert!(doc
            .slot(Shift::Afternoon, TimeSlot::OnePm)
            .unwrap()
            .cars
            .is_empty());
    }

    #[test]
    fn other_weekday_adds_nothing() {
        let mut doc =
            CarpoolDocument::empty(NaiveDate::from_ymd_opt(2024, 9, 3).unwrap());
        let driver = driver_with(DayAvailability {
            morning: vec![TimeSlot::EightAm],
            afternoon: vec![TimeSlot::TwoPm],
        });
        assert_eq!(reconcile_driver_availability(&mut doc, &driver).unwrap(), 0);
    }
}
