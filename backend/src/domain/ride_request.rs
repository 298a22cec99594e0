//! Ride request offers broadcast to candidate drivers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{RideId, RideRequestId, UserId, VehicleId};

/// Unit of a driver-supplied pickup ETA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtaUnit {
    /// ETA expressed in minutes.
    Minutes,
    /// ETA expressed in hours.
    Hours,
}

/// Pickup ETA quoted by the accepting driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtaEstimate {
    /// Magnitude of the estimate.
    pub number: u32,
    /// Unit of the estimate.
    pub unit: EtaUnit,
}

/// Derived state of one broadcast offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Still open for the driver to answer.
    Open,
    /// Accepted by its driver; the ride is assigned.
    Accepted,
    /// Rejected by its driver; the ride stays open to siblings.
    Rejected,
    /// Closed because a sibling request was accepted first.
    Superseded,
}

/// One broadcast offer to one driver for one ride.
///
/// ## Invariants
/// - For a given `ride_id`, at most one request has `is_accepted == true` at
///   any time; once any sibling is accepted the rest become unavailable.
/// - A request is immutable once accepted or rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRequest {
    /// Request id.
    pub id: RideRequestId,
    /// The ride this offer services.
    pub ride_id: RideId,
    /// Requesting rider.
    pub rider_id: UserId,
    /// Driver the offer was sent to.
    pub driver_id: UserId,
    /// Vehicle the driver would service the ride with.
    pub vehicle_id: VehicleId,
    /// Whether this offer was accepted.
    pub is_accepted: bool,
    /// Whether this offer was rejected by its driver.
    pub is_rejected: bool,
    /// Whether this offer is still open (false once a sibling wins).
    pub available: bool,
    /// When the offer was accepted.
    pub accepted_at: Option<DateTime<Utc>>,
    /// When the offer was rejected.
    pub rejected_at: Option<DateTime<Utc>>,
    /// ETA quoted at acceptance.
    pub eta: Option<EtaEstimate>,
}

impl RideRequest {
    /// Build the open offer persisted at broadcast time.
    #[must_use]
    pub fn open(ride_id: RideId, rider_id: UserId, driver_id: UserId, vehicle_id: VehicleId) -> Self {
        Self {
            id: RideRequestId::random(),
            ride_id,
            rider_id,
            driver_id,
            vehicle_id,
            is_accepted: false,
            is_rejected: false,
            available: true,
            accepted_at: None,
            rejected_at: None,
            eta: None,
        }
    }

    /// Derived offer state.
    #[must_use]
    pub fn state(&self) -> RequestState {
        if self.is_accepted {
            RequestState::Accepted
        } else if self.is_rejected {
            RequestState::Rejected
        } else if self.available {
            RequestState::Open
        } else {
            RequestState::Superseded
        }
    }
}
