//! Candidate vehicle selection for dispatch.
//!
//! Selection is a pure filter over a fleet snapshot; the dispatch service
//! owns fetching the snapshot and broadcasting to the surviving drivers.

use serde_json::json;

use crate::domain::vehicle::Vehicle;
use crate::domain::Error;

/// Keep only vehicles that are online, not booked, and have a driver linked.
///
/// Order is preserved so broadcast fan-out stays deterministic for a given
/// snapshot.
#[must_use]
pub fn filter_dispatchable(fleet: Vec<Vehicle>) -> Vec<Vehicle> {
    fleet
        .into_iter()
        .filter(Vehicle::is_dispatchable)
        .collect()
}

/// Error raised when the filtered candidate set is empty.
#[must_use]
pub fn no_vehicles_available() -> Error {
    Error::not_found("no vehicles are available right now")
        .with_details(json!({ "code": "no_vehicles_available" }))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::ids::{UserId, VehicleId};
    use crate::domain::ErrorCode;

    fn vehicle(online: bool, booked: bool, driver: Option<UserId>) -> Vehicle {
        Vehicle {
            id: VehicleId::random(),
            current_driver_id: driver,
            online,
            booked,
            registration_number: "CA1234AB".into(),
        }
    }

    #[rstest]
    #[case::offline(false, false, true, false)]
    #[case::booked(true, true, true, false)]
    #[case::driverless(true, false, false, false)]
    #[case::dispatchable(true, false, true, true)]
    fn filters_on_all_three_criteria(
        #[case] online: bool,
        #[case] booked: bool,
        #[case] has_driver: bool,
        #[case] kept: bool,
    ) {
        let driver = has_driver.then(UserId::random);
        let candidates = filter_dispatchable(vec![vehicle(online, booked, driver)]);
        assert_eq!(candidates.len(), usize::from(kept));
    }

    #[test]
    fn preserves_snapshot_order() {
        let first = vehicle(true, false, Some(UserId::random()));
        let second = vehicle(true, false, Some(UserId::random()));
        let expected = vec![first.id, second.id];

        let candidates = filter_dispatchable(vec![
            first,
            vehicle(false, false, Some(UserId::random())),
            second,
        ]);
        let ids: Vec<_> = candidates.iter().map(|v| v.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn empty_candidate_error_is_not_found() {
        assert_eq!(no_vehicles_available().code(), ErrorCode::NotFound);
    }
}
