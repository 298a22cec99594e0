//! Vehicle records and dispatch eligibility.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{UserId, VehicleId};

/// A vehicle owned by a driver account at a point in time.
///
/// ## Invariants
/// - A vehicle with `booked == true` is never eligible for new ride-request
///   broadcast; `booked` is set on acceptance and released on ride
///   cancellation, rejection, and completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle id.
    pub id: VehicleId,
    /// Driver currently linked to the vehicle, if any.
    pub current_driver_id: Option<UserId>,
    /// Whether the driver is online and taking requests.
    pub online: bool,
    /// Whether the vehicle is already servicing a ride.
    pub booked: bool,
    /// Licence plate.
    pub registration_number: String,
}

impl Vehicle {
    /// Whether the vehicle may receive a new ride-request broadcast.
    #[must_use]
    pub fn is_dispatchable(&self) -> bool {
        self.online && !self.booked && self.current_driver_id.is_some()
    }
}
