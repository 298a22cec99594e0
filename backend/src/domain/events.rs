//! Lifecycle facts emitted towards the notification boundary.
//!
//! The engine publishes these after the authoritative write commits; a
//! downstream dispatcher (out of scope here) fans them out to email, SMS, or
//! push. Sink failures are logged and never roll back engine state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::UserId;
use crate::domain::ride::Ride;
use crate::domain::ride_request::RideRequest;

/// Fact emitted when a ride is created and broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideCreatedEvent {
    /// Snapshot of the new ride.
    pub ride: Ride,
    /// Drivers the ride was offered to.
    pub offered_driver_ids: Vec<UserId>,
}

/// Fact emitted when a driver wins the acceptance race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRequestAcceptedEvent {
    /// Snapshot of the assigned ride.
    pub ride: Ride,
    /// The winning request, including the quoted ETA.
    pub request: RideRequest,
}

/// Fact emitted when a driver declines an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRequestRejectedEvent {
    /// The rejected request.
    pub request: RideRequest,
}

/// Fact emitted when the assigned vehicle reports arrival at pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleArrivedEvent {
    /// Snapshot of the ride, including `vehicle_arrived_at`.
    pub ride: Ride,
}

/// Fact emitted when a trip starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideStartedEvent {
    /// Snapshot of the in-progress ride.
    pub ride: Ride,
}

/// Fact emitted when a trip completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideCompletedEvent {
    /// Snapshot of the completed ride, including its duration.
    pub ride: Ride,
}

/// Fact emitted when a ride is cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideCancelledEvent {
    /// Snapshot of the cancelled ride.
    pub ride: Ride,
    /// Who cancelled.
    pub cancelled_by: UserId,
    /// When the cancellation happened.
    pub cancelled_at: DateTime<Utc>,
}

/// Ride lifecycle domain events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RideEvent {
    /// A ride was created and broadcast.
    RideCreated(RideCreatedEvent),
    /// A driver accepted a ride request.
    RideRequestAccepted(RideRequestAcceptedEvent),
    /// A driver rejected a ride request.
    RideRequestRejected(RideRequestRejectedEvent),
    /// The assigned vehicle arrived at pickup.
    VehicleArrived(VehicleArrivedEvent),
    /// A trip started.
    RideStarted(RideStartedEvent),
    /// A trip completed.
    RideCompleted(RideCompletedEvent),
    /// A ride was cancelled.
    RideCancelled(RideCancelledEvent),
}

impl RideEvent {
    /// Stable fact name for sinks and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RideCreated(_) => "ride_created",
            Self::RideRequestAccepted(_) => "ride_request_accepted",
            Self::RideRequestRejected(_) => "ride_request_rejected",
            Self::VehicleArrived(_) => "vehicle_arrived",
            Self::RideStarted(_) => "ride_started",
            Self::RideCompleted(_) => "ride_completed",
            Self::RideCancelled(_) => "ride_cancelled",
        }
    }
}
