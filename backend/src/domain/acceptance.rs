//! Driver responses to broadcast ride requests: accept and reject.
//!
//! Accept is the engine's only true race: several drivers may answer the
//! same ride inside the same short window. The precondition ladder here is
//! advisory; the authoritative decision is the repository's conditional
//! assignment write, which exactly one caller can win. Transient repository
//! failures are retried a bounded number of times; a lost race never is.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::config::DispatchConfig;
use crate::domain::events::{RideEvent, RideRequestAcceptedEvent, RideRequestRejectedEvent};
use crate::domain::ids::RideRequestId;
use crate::domain::ports::{
    AssignDriverOutcome, DriverAssignment, EventSink, RideRepository, RideRepositoryError,
    RideRequestRepository, RideRequestRepositoryError, VehicleRepository,
};
use crate::domain::ride::{Ride, RideStatus};
use crate::domain::ride_request::{EtaEstimate, RideRequest};
use crate::domain::{Actor, Error, Role};

fn map_request_repository_error(error: RideRequestRepositoryError) -> Error {
    match error {
        RideRequestRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ride request repository unavailable: {message}"))
        }
        RideRequestRepositoryError::Query { message } => {
            Error::internal(format!("ride request repository error: {message}"))
        }
    }
}

fn map_ride_repository_error(error: RideRepositoryError) -> Error {
    match error {
        RideRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ride repository unavailable: {message}"))
        }
        RideRepositoryError::Query { message } => {
            Error::internal(format!("ride repository error: {message}"))
        }
    }
}

fn request_not_found(request_id: RideRequestId) -> Error {
    Error::not_found(format!("ride request {request_id} not found"))
        .with_details(json!({ "code": "request_not_found" }))
}

fn accepted_by_other_driver() -> Error {
    Error::state_conflict("ride was already accepted by another driver")
        .with_details(json!({ "code": "accepted_by_other_driver" }))
}

/// Result of a winning [`AcceptanceService::accept`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptRideResponse {
    /// The ride, now assigned to the caller.
    pub ride: Ride,
    /// The accepted request, stamped with the quoted ETA.
    pub request: RideRequest,
}

/// Result of a [`AcceptanceService::reject`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectRideResponse {
    /// The rejected request.
    pub request: RideRequest,
}

/// Collaborator ports for [`AcceptanceService`].
#[derive(Clone)]
pub struct AcceptancePorts {
    /// Request reads and the rejection write.
    pub requests: Arc<dyn RideRequestRepository>,
    /// Ride reads and the conditional assignment write.
    pub rides: Arc<dyn RideRepository>,
    /// Vehicle booking-flag writes.
    pub vehicles: Arc<dyn VehicleRepository>,
    /// Lifecycle fact sink.
    pub events: Arc<dyn EventSink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Resolves driver answers to broadcast requests.
#[derive(Clone)]
pub struct AcceptanceService {
    config: DispatchConfig,
    ports: AcceptancePorts,
}

impl AcceptanceService {
    /// Construct the service with its configuration and collaborators.
    #[must_use]
    pub fn new(config: DispatchConfig, ports: AcceptancePorts) -> Self {
        Self { config, ports }
    }

    /// Accept a broadcast request on behalf of its driver.
    ///
    /// At most one concurrent accept per ride succeeds; every other caller
    /// gets a conflict or [`crate::domain::ErrorCode::RaceLost`]. Sibling
    /// requests are closed and the vehicle booked in the same atomic write.
    pub async fn accept(
        &self,
        actor: &Actor,
        request_id: RideRequestId,
        eta: EtaEstimate,
    ) -> Result<AcceptRideResponse, Error> {
        actor.require_role(Role::Driver)?;

        let request = self.load_owned_request(actor, request_id).await?;
        if request.is_accepted {
            return Err(Error::state_conflict("ride request is already accepted")
                .with_details(json!({ "code": "already_accepted" })));
        }

        let siblings = self
            .ports
            .requests
            .list_for_ride(request.ride_id)
            .await
            .map_err(map_request_repository_error)?;
        if siblings.iter().any(|sibling| sibling.is_accepted) {
            return Err(accepted_by_other_driver());
        }

        let ride = self
            .ports
            .rides
            .find_by_id(request.ride_id)
            .await
            .map_err(map_ride_repository_error)?
            .ok_or_else(|| Error::not_found(format!("ride {} not found", request.ride_id)))?;
        if ride.driver_id.is_some() {
            return Err(accepted_by_other_driver());
        }
        if ride.status != RideStatus::New {
            return Err(Error::state_conflict(format!(
                "ride cannot be accepted from status {}",
                ride.status.as_str()
            ))
            .with_details(json!({ "code": "invalid_status_to_accept" })));
        }

        let assignment = DriverAssignment {
            ride_id: request.ride_id,
            request_id: request.id,
            driver_id: actor.user_id(),
            vehicle_id: request.vehicle_id,
            eta,
            accepted_at: self.ports.clock.utc(),
        };

        match self.assign_with_retry(assignment).await? {
            AssignDriverOutcome::Assigned { ride, request } => {
                info!(
                    ride_id = %ride.id,
                    driver_id = %actor.user_id(),
                    "driver accepted ride"
                );
                self.publish(RideEvent::RideRequestAccepted(RideRequestAcceptedEvent {
                    ride: ride.clone(),
                    request: request.clone(),
                }))
                .await;
                Ok(AcceptRideResponse { ride, request })
            }
            AssignDriverOutcome::Lost { ride } => {
                if ride.driver_id.is_some() {
                    Err(Error::race_lost("another driver accepted the ride first")
                        .with_details(json!({ "code": "accepted_by_other_driver" })))
                } else {
                    Err(Error::state_conflict(format!(
                        "ride cannot be accepted from status {}",
                        ride.status.as_str()
                    ))
                    .with_details(json!({ "code": "invalid_status_to_accept" })))
                }
            }
        }
    }

    /// Reject a broadcast request on behalf of its driver.
    ///
    /// Rejection frees the driver's vehicle and never changes the ride's
    /// status; the ride stays open to sibling requests.
    pub async fn reject(
        &self,
        actor: &Actor,
        request_id: RideRequestId,
    ) -> Result<RejectRideResponse, Error> {
        actor.require_role(Role::Driver)?;

        let request = self.load_owned_request(actor, request_id).await?;
        if request.is_rejected {
            return Err(Error::state_conflict("ride request is already rejected")
                .with_details(json!({ "code": "already_rejected" })));
        }

        let ride = self
            .ports
            .rides
            .find_by_id(request.ride_id)
            .await
            .map_err(map_ride_repository_error)?
            .ok_or_else(|| Error::not_found(format!("ride {} not found", request.ride_id)))?;
        if ride.status != RideStatus::New {
            return Err(Error::state_conflict(format!(
                "ride cannot be rejected from status {}",
                ride.status.as_str()
            ))
            .with_details(json!({ "code": "invalid_status_to_reject" })));
        }

        let rejected = self
            .ports
            .requests
            .mark_rejected(request.id, self.ports.clock.utc())
            .await
            .map_err(map_request_repository_error)?
            .ok_or_else(|| request_not_found(request.id))?;

        if let Err(error) = self
            .ports
            .vehicles
            .set_booked(request.vehicle_id, false)
            .await
        {
            warn!(
                %error,
                vehicle_id = %request.vehicle_id,
                "failed to release vehicle after rejection"
            );
        }

        self.publish(RideEvent::RideRequestRejected(RideRequestRejectedEvent {
            request: rejected.clone(),
        }))
        .await;

        Ok(RejectRideResponse { request: rejected })
    }

    async fn load_owned_request(
        &self,
        actor: &Actor,
        request_id: RideRequestId,
    ) -> Result<RideRequest, Error> {
        let request = self
            .ports
            .requests
            .find_by_id(request_id)
            .await
            .map_err(map_request_repository_error)?
            .ok_or_else(|| request_not_found(request_id))?;

        if request.driver_id != actor.user_id() {
            return Err(Error::forbidden(
                "ride request belongs to a different driver",
            )
            .with_details(json!({ "code": "not_authorized" })));
        }
        Ok(request)
    }

    /// Attempt the conditional assignment, retrying only transient
    /// connection failures up to the configured bound. A definitive
    /// [`AssignDriverOutcome::Lost`] is never retried.
    async fn assign_with_retry(
        &self,
        assignment: DriverAssignment,
    ) -> Result<AssignDriverOutcome, Error> {
        let limit = self.config.accept_retry_limit();
        let mut last_message = String::new();
        for attempt in 1..=limit {
            match self.ports.rides.try_assign_driver(assignment.clone()).await {
                Ok(outcome) => return Ok(outcome),
                Err(RideRepositoryError::Connection { message }) => {
                    warn!(
                        attempt,
                        limit,
                        %message,
                        ride_id = %assignment.ride_id,
                        "assignment write failed, retrying"
                    );
                    last_message = message;
                }
                Err(error @ RideRepositoryError::Query { .. }) => {
                    return Err(map_ride_repository_error(error));
                }
            }
        }
        Err(Error::race_lost(format!(
            "could not complete the assignment after {limit} attempts: {last_message}"
        )))
    }

    async fn publish(&self, event: RideEvent) {
        let name = event.name();
        if let Err(error) = self.ports.events.publish(event).await {
            warn!(%error, event = name, "failed to publish acceptance event");
        }
    }
}
