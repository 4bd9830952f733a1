use carpool_core::db::open_db_in_memory;
use carpool_core::{
    AssignReason, CarId, CarToggle, CarpoolOp, CarpoolRepository, CarpoolService, DayAvailability,
    DayName, Driver, DriverCar, OpOutcome, Rider, ServiceError, Shift, SqliteCarpoolRepository,
    TimeSlot,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

fn driver(seats: u32) -> Driver {
    let mut availability = BTreeMap::new();
    availability.insert(
        DayName::Monday,
        DayAvailability {
            morning: vec![TimeSlot::EightAm],
            afternoon: vec![TimeSlot::TwoPm],
        },
    );
    Driver {
        id: "P1".to_string(),
        name: "Parent A".to_string(),
        phone: "+972501234567".to_string(),
        cars: vec![DriverCar {
            plate: "X".to_string(),
            seats,
            is_default: true,
            is_taxi: false,
        }],
        availability,
    }
}

#[test]
fn get_or_create_is_stable_per_date() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarpoolRepository::try_new(&conn).unwrap();
    let service = CarpoolService::new(&repo);

    let first = service.get_or_create(monday()).unwrap();
    let second = service.get_or_create(monday()).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.document.date, monday());
}

#[test]
fn transact_persists_changes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarpoolRepository::try_new(&conn).unwrap();
    let service = CarpoolService::new(&repo);

    let done = service
        .transact(
            monday(),
            &[CarpoolOp::AssignRider {
                rider: Rider::new("K1", "Kid1"),
                slot: TimeSlot::EightAm,
                shift: Shift::Morning,
                preferred: None,
            }],
        )
        .unwrap();

    assert!(done.persisted);
    let stored = repo.load_by_date(monday()).unwrap().unwrap();
    assert!(stored
        .document
        .slot(Shift::Morning, TimeSlot::EightAm)
        .unwrap()
        .is_unassigned("K1"));
}

#[test]
fn transact_with_malformed_op_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarpoolRepository::try_new(&conn).unwrap();
    let service = CarpoolService::new(&repo);

    let err = service
        .transact(
            monday(),
            &[
                CarpoolOp::AssignRider {
                    rider: Rider::new("K1", "Kid1"),
                    slot: TimeSlot::EightAm,
                    shift: Shift::Morning,
                    preferred: None,
                },
                CarpoolOp::UnassignRider {
                    rider_id: "K1".to_string(),
                    slot: TimeSlot::TwoPm,
                    shift: Shift::Morning,
                },
            ],
        )
        .unwrap_err();

    assert!(matches!(err, ServiceError::Engine(_)));
    let stored = repo.load_by_date(monday()).unwrap().unwrap();
    assert_eq!(
        stored
            .document
            .slot(Shift::Morning, TimeSlot::EightAm)
            .unwrap()
            .unassigned_riders
            .len(),
        0
    );
}

#[test]
fn load_for_driver_adds_default_car_once() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarpoolRepository::try_new(&conn).unwrap();
    let service = CarpoolService::new(&repo);
    let parent = driver(3);

    let first = service.load_for_driver(monday(), &parent).unwrap();
    assert!(first.persisted);
    assert_eq!(first.outcomes, vec![OpOutcome::DriverReconciled { added: 2 }]);

    let second = service.load_for_driver(monday(), &parent).unwrap();
    assert!(!second.persisted);
    assert_eq!(second.outcomes, vec![OpOutcome::DriverReconciled { added: 0 }]);

    let car_id = CarId::new("P1", "X");
    let doc = &second.carpool.document;
    assert!(doc
        .slot(Shift::Morning, TimeSlot::EightAm)
        .unwrap()
        .has_car(&car_id));
    assert!(doc
        .slot(Shift::Afternoon, TimeSlot::TwoPm)
        .unwrap()
        .has_car(&car_id));
    assert!(!doc
        .slot(Shift::Morning, TimeSlot::NineAm)
        .unwrap()
        .has_car(&car_id));
}

#[test]
fn load_for_driver_keeps_existing_riders() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarpoolRepository::try_new(&conn).unwrap();
    let service = CarpoolService::new(&repo);
    let parent = driver(3);
    let car_id = CarId::new("P1", "X");

    service.load_for_driver(monday(), &parent).unwrap();
    service
        .join_car(
            monday(),
            &Rider::new("K1", "Kid1"),
            TimeSlot::EightAm,
            Shift::Morning,
            &car_id,
        )
        .unwrap();
    let reloaded = service.load_for_driver(monday(), &parent).unwrap();

    let state = reloaded
        .carpool
        .document
        .slot(Shift::Morning, TimeSlot::EightAm)
        .unwrap()
        .clone();
    assert_eq!(state.find_car(&car_id).unwrap().assigned_riders.len(), 1);
}

#[test]
fn toggle_offers_then_withdraws_default_car() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarpoolRepository::try_new(&conn).unwrap();
    let service = CarpoolService::new(&repo);
    let parent = driver(2);
    let car_id = CarId::new("P1", "X");

    let offered = service
        .toggle_driver_car(monday(), &parent, TimeSlot::NineAm, Shift::Morning)
        .unwrap();
    assert_eq!(offered, CarToggle::Offered(car_id.clone()));

    service
        .join_car(
            monday(),
            &Rider::new("K1", "Kid1"),
            TimeSlot::NineAm,
            Shift::Morning,
            &car_id,
        )
        .unwrap();

    let withdrawn = service
        .toggle_driver_car(monday(), &parent, TimeSlot::NineAm, Shift::Morning)
        .unwrap();
    assert_eq!(withdrawn, CarToggle::Withdrawn(car_id.clone()));

    let doc = repo.load_by_date(monday()).unwrap().unwrap().document;
    let state = doc.slot(Shift::Morning, TimeSlot::NineAm).unwrap();
    assert!(!state.has_car(&car_id));
    assert!(state.is_unassigned("K1"));
    assert_eq!(doc.notifications.len(), 1);
}

#[test]
fn toggle_without_cars_fails() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarpoolRepository::try_new(&conn).unwrap();
    let service = CarpoolService::new(&repo);
    let mut parent = driver(2);
    parent.cars.clear();

    let err = service
        .toggle_driver_car(monday(), &parent, TimeSlot::NineAm, Shift::Morning)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoCars(ref id) if id == "P1"));
}

#[test]
fn join_moves_rider_between_cars() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarpoolRepository::try_new(&conn).unwrap();
    let service = CarpoolService::new(&repo);
    let mut second_parent = driver(2);
    second_parent.id = "P2".to_string();
    service.load_for_driver(monday(), &driver(2)).unwrap();
    service.load_for_driver(monday(), &second_parent).unwrap();
    let rider = Rider::new("K1", "Kid1");

    let first = service
        .join_car(
            monday(),
            &rider,
            TimeSlot::EightAm,
            Shift::Morning,
            &CarId::new("P1", "X"),
        )
        .unwrap();
    assert!(first.success);
    let second = service
        .join_car(
            monday(),
            &rider,
            TimeSlot::EightAm,
            Shift::Morning,
            &CarId::new("P2", "X"),
        )
        .unwrap();
    assert!(second.success);

    let doc = repo.load_by_date(monday()).unwrap().unwrap().document;
    let state = doc.slot(Shift::Morning, TimeSlot::EightAm).unwrap();
    assert_eq!(state.car_of_rider("K1").unwrap().id, CarId::new("P2", "X"));
    assert_eq!(
        state
            .find_car(&CarId::new("P1", "X"))
            .unwrap()
            .assigned_riders
            .len(),
        0
    );
}

#[test]
fn failed_join_leaves_rider_in_previous_car() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarpoolRepository::try_new(&conn).unwrap();
    let service = CarpoolService::new(&repo);
    let mut tiny = driver(1);
    tiny.id = "P2".to_string();
    service.load_for_driver(monday(), &driver(2)).unwrap();
    service.load_for_driver(monday(), &tiny).unwrap();

    service
        .join_car(
            monday(),
            &Rider::new("K0", "Kid0"),
            TimeSlot::EightAm,
            Shift::Morning,
            &CarId::new("P2", "X"),
        )
        .unwrap();
    let rider = Rider::new("K1", "Kid1");
    service
        .join_car(
            monday(),
            &rider,
            TimeSlot::EightAm,
            Shift::Morning,
            &CarId::new("P1", "X"),
        )
        .unwrap();
    let before = repo.load_by_date(monday()).unwrap().unwrap().document;

    let outcome = service
        .join_car(
            monday(),
            &rider,
            TimeSlot::EightAm,
            Shift::Morning,
            &CarId::new("P2", "X"),
        )
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.reason, AssignReason::CarFull);
    let after = repo.load_by_date(monday()).unwrap().unwrap().document;
    assert_eq!(after, before);
}

#[test]
fn leave_slot_and_flag_car() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarpoolRepository::try_new(&conn).unwrap();
    let service = CarpoolService::new(&repo);
    let car_id = CarId::new("P1", "X");
    service.load_for_driver(monday(), &driver(2)).unwrap();
    service
        .join_car(
            monday(),
            &Rider::new("K1", "Kid1"),
            TimeSlot::EightAm,
            Shift::Morning,
            &car_id,
        )
        .unwrap();

    assert!(service
        .flag_car_unavailable(monday(), &car_id, TimeSlot::EightAm, Shift::Morning)
        .unwrap());
    assert!(!service
        .flag_car_unavailable(
            monday(),
            &CarId::new("P9", "Z"),
            TimeSlot::EightAm,
            Shift::Morning
        )
        .unwrap());
    service
        .leave_slot(monday(), "K1", TimeSlot::EightAm, Shift::Morning)
        .unwrap();

    let doc = repo.load_by_date(monday()).unwrap().unwrap().document;
    let state = doc.slot(Shift::Morning, TimeSlot::EightAm).unwrap();
    let car = state.find_car(&car_id).unwrap();
    assert!(!car.is_available);
    assert!(car.assigned_riders.is_empty());
    assert_eq!(doc.notifications.len(), 1);
}
