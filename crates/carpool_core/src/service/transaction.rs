//! Batch application of engine operations.
//!
//! # Responsibility
//! - Apply an ordered list of engine operations to a copy of a document.
//! - Report one outcome per operation.
//!
//! # Invariants
//! - The input document is never mutated.
//! - Either every operation applies or the call returns an error and no
//!   document.

use crate::model::carpool::{CarId, CarSpec, CarpoolDocument, Rider};
use crate::model::profile::Driver;
use crate::model::slot::{Shift, TimeSlot};
use crate::service::assignment::{
    add_car, assign_rider, auto_assign_unassigned, mark_car_unavailable, remove_car,
    unassign_rider, AssignOutcome, EngineResult,
};
use crate::service::reconcile::reconcile_driver_availability;

/// One engine call, with its explicit caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarpoolOp {
    AddCar {
        driver_id: String,
        driver_name: String,
        spec: CarSpec,
        slot: TimeSlot,
        shift: Shift,
    },
    RemoveCar {
        car_id: CarId,
        slot: TimeSlot,
        shift: Shift,
    },
    AssignRider {
        rider: Rider,
        slot: TimeSlot,
        shift: Shift,
        preferred: Option<CarId>,
    },
    UnassignRider {
        rider_id: String,
        slot: TimeSlot,
        shift: Shift,
    },
    MarkCarUnavailable {
        car_id: CarId,
        slot: TimeSlot,
        shift: Shift,
    },
    AutoAssignUnassigned {
        slot: TimeSlot,
        shift: Shift,
    },
    ReconcileDriver {
        driver: Driver,
    },
}

/// Per-operation result, in operation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    CarAdded(CarId),
    CarRemoved { found: bool },
    RiderAssigned(AssignOutcome),
    RiderUnassigned,
    CarMarkedUnavailable { found: bool },
    AutoAssigned { remaining: usize },
    DriverReconciled { added: usize },
}

/// Output of `apply_operations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub document: CarpoolDocument,
    pub outcomes: Vec<OpOutcome>,
    /// Whether `document` differs from the input.
    pub changed: bool,
}

/// Applies `ops` in order to a copy of `doc`.
///
/// # Errors
/// - Returns the first engine error; the input document stays as it was.
pub fn apply_operations(doc: &CarpoolDocument, ops: &[CarpoolOp]) -> EngineResult<Applied> {
    let mut next = doc.clone();
    let mut outcomes = Vec::with_capacity(ops.len());

    for op in ops {
        outcomes.push(apply_one(&mut next, op)?);
    }

    let changed = &next != doc;
    Ok(Applied {
        document: next,
        outcomes,
        changed,
    })
}

fn apply_one(doc: &mut CarpoolDocument, op: &CarpoolOp) -> EngineResult<OpOutcome> {
    let outcome = match op {
        CarpoolOp::AddCar {
            driver_id,
            driver_name,
            spec,
            slot,
            shift,
        } => OpOutcome::CarAdded(add_car(doc, driver_id, driver_name, spec, *slot, *shift)?),
        CarpoolOp::RemoveCar {
            car_id,
            slot,
            shift,
        } => OpOutcome::CarRemoved {
            found: remove_car(doc, car_id, *slot, *shift)?,
        },
        CarpoolOp::AssignRider {
            rider,
            slot,
            shift,
            preferred,
        } => OpOutcome::RiderAssigned(assign_rider(
            doc,
            &rider.id,
            &rider.name,
            *slot,
            *shift,
            preferred.as_ref(),
        )?),
        CarpoolOp::UnassignRider {
            rider_id,
            slot,
            shift,
        } => {
            unassign_rider(doc, rider_id, *slot, *shift)?;
            OpOutcome::RiderUnassigned
        }
        CarpoolOp::MarkCarUnavailable {
            car_id,
            slot,
            shift,
        } => OpOutcome::CarMarkedUnavailable {
            found: mark_car_unavailable(doc, car_id, *slot, *shift)?,
        },
        CarpoolOp::AutoAssignUnassigned { slot, shift } => OpOutcome::AutoAssigned {
            remaining: auto_assign_unassigned(doc, *slot, *shift)?,
        },
        CarpoolOp::ReconcileDriver { driver } => OpOutcome::DriverReconciled {
            added: reconcile_driver_availability(doc, driver)?,
        },
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::{apply_operations, CarpoolOp, OpOutcome};
    use crate::model::carpool::{CarId, CarSpec, CarpoolDocument, Rider};
    use crate::model::slot::{Shift, TimeSlot};
    use crate::service::assignment::AssignReason;
    use chrono::NaiveDate;

    fn doc() -> CarpoolDocument {
        CarpoolDocument::empty(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap())
    }

    fn offer(slot: TimeSlot, shift: Shift) -> CarpoolOp {
        CarpoolOp::AddCar {
            driver_id: "P1".to_string(),
            driver_name: "Parent A".to_string(),
            spec: CarSpec::new("X", 1),
            slot,
            shift,
        }
    }

    #[test]
    fn applies_in_order_without_touching_input() {
        let input = doc();
        let applied = apply_operations(
            &input,
            &[
                offer(TimeSlot::NineAm, Shift::Morning),
                CarpoolOp::AssignRider {
                    rider: Rider::new("K1", "Kid1"),
                    slot: TimeSlot::NineAm,
                    shift: Shift::Morning,
                    preferred: None,
                },
                CarpoolOp::AssignRider {
                    rider: Rider::new("K2", "Kid2"),
                    slot: TimeSlot::NineAm,
                    shift: Shift::Morning,
                    preferred: Some(CarId::new("P1", "X")),
                },
            ],
        )
        .unwrap();

        assert!(applied.changed);
        assert_eq!(input, doc());
        assert_eq!(applied.outcomes[0], OpOutcome::CarAdded(CarId::new("P1", "X")));
        match &applied.outcomes[2] {
            OpOutcome::RiderAssigned(outcome) => {
                assert!(!outcome.success);
                assert_eq!(outcome.reason, AssignReason::CarFull);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn failing_operation_discards_whole_batch() {
        let input = doc();
        let result = apply_operations(
            &input,
            &[
                offer(TimeSlot::NineAm, Shift::Morning),
                offer(TimeSlot::TwoPm, Shift::Morning),
            ],
        );
        assert!(result.is_err());
        assert_eq!(input, doc());
    }

    #[test]
    fn no_op_batch_reports_unchanged() {
        let input = doc();
        let applied = apply_operations(
            &input,
            &[CarpoolOp::RemoveCar {
                car_id: CarId::new("P9", "Z"),
                slot: TimeSlot::OnePm,
                shift: Shift::Afternoon,
            }],
        )
        .unwrap();
        assert!(!applied.changed);
        assert_eq!(applied.outcomes, vec![OpOutcome::CarRemoved { found: false }]);
    }
}
