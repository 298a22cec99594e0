//! Port for ride persistence, quota counts, and the contended assignment and
//! lifecycle writes.
//!
//! The conditional methods on this port carry the engine's atomicity
//! contract: their precondition check and write must be one atomic unit
//! against the backing store. Check-then-act across two calls is a
//! lost-update race, not an implementation choice.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ids::{PassId, RideId, RideRequestId, UserId, VehicleId};
use crate::domain::ride::{Ride, RideStatus};
use crate::domain::ride_request::{EtaEstimate, RideRequest};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ride repository adapters.
    pub enum RideRepositoryError {
        /// Repository connection could not be established.
        Connection => "ride repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query => "ride repository query failed: {message}",
    }
}

/// Payload for the atomic driver assignment write.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverAssignment {
    /// Ride being assigned.
    pub ride_id: RideId,
    /// The winning request.
    pub request_id: RideRequestId,
    /// Accepting driver.
    pub driver_id: UserId,
    /// Vehicle servicing the ride.
    pub vehicle_id: VehicleId,
    /// ETA quoted by the driver.
    pub eta: EtaEstimate,
    /// Acceptance timestamp.
    pub accepted_at: DateTime<Utc>,
}

/// Outcome of the conditional driver assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignDriverOutcome {
    /// This call won the race: the ride is assigned, all sibling requests are
    /// closed, and the vehicle is booked.
    Assigned {
        /// Ride after assignment.
        ride: Ride,
        /// The accepted request.
        request: RideRequest,
    },
    /// The precondition no longer held (driver already assigned or status no
    /// longer [`RideStatus::New`]); nothing was written.
    Lost {
        /// The ride as currently stored, for conflict diagnosis.
        ride: Ride,
    },
}

/// Status-changing writes applied through [`RideRepository::apply_transition`].
#[derive(Debug, Clone, PartialEq)]
pub enum RideTransition {
    /// Record vehicle arrival; status stays [`RideStatus::Assigned`].
    VehicleArrived {
        /// Arrival timestamp.
        at: DateTime<Utc>,
    },
    /// Start the trip; [`RideStatus::Assigned`] → [`RideStatus::InProgress`].
    Start {
        /// Trip start timestamp.
        at: DateTime<Utc>,
    },
    /// Finish the trip; [`RideStatus::InProgress`] → [`RideStatus::Complete`].
    /// Adapters release the assigned vehicle in the same atomic write.
    Complete {
        /// Trip end timestamp.
        at: DateTime<Utc>,
        /// Trip duration in whole minutes.
        duration_minutes: i64,
        /// Optional uploaded route map reference.
        route_map_file_id: Option<String>,
    },
    /// Cancel the ride from any non-terminal status. Adapters release the
    /// assigned vehicle, if any, in the same atomic write.
    Cancel {
        /// Cancelling actor.
        by: UserId,
        /// Caller-provided reason.
        reason: String,
        /// Cancellation timestamp.
        at: DateTime<Utc>,
    },
}

/// Outcome of a conditional lifecycle transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Precondition held; the write was applied.
    Applied(Ride),
    /// The ride was no longer in the expected status; nothing was written.
    Conflict(Ride),
}

/// Port for ride persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RideRepository: Send + Sync {
    /// Persist a ride and its broadcast requests as one atomic unit.
    ///
    /// Readers must never observe the ride without its requests; if any part
    /// fails, nothing is visible.
    async fn create_with_requests(
        &self,
        ride: &Ride,
        requests: &[RideRequest],
    ) -> Result<(), RideRepositoryError>;

    /// Find a ride by id.
    async fn find_by_id(&self, ride_id: RideId) -> Result<Option<Ride>, RideRepositoryError>;

    /// Count rides consuming quota on a pass, optionally restricted to those
    /// requested at or after `since`.
    async fn count_quota_consuming(
        &self,
        pass_id: PassId,
        since: Option<DateTime<Utc>>,
    ) -> Result<u64, RideRepositoryError>;

    /// Count every ride ever created against a pass, cancelled or not.
    ///
    /// Drives the first-ride-ever check guarding window activation.
    async fn count_all_for_pass(&self, pass_id: PassId) -> Result<u64, RideRepositoryError>;

    /// Conditionally assign a driver, keyed on `driver_id IS NULL AND status
    /// = new` in the same atomic write that closes sibling requests, stamps
    /// the accepted request, and books the vehicle.
    ///
    /// Exactly one of any number of concurrent calls for the same ride may
    /// observe [`AssignDriverOutcome::Assigned`].
    async fn try_assign_driver(
        &self,
        assignment: DriverAssignment,
    ) -> Result<AssignDriverOutcome, RideRepositoryError>;

    /// Conditionally apply a lifecycle transition, keyed on the ride still
    /// holding `expected_status` in the same atomic write.
    /// Returns `Ok(None)` when the ride does not exist.
    async fn apply_transition(
        &self,
        ride_id: RideId,
        expected_status: RideStatus,
        transition: RideTransition,
    ) -> Result<Option<TransitionOutcome>, RideRepositoryError>;
}
