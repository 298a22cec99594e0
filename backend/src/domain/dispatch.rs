//! Ride creation: entitlement, geofence, candidate filtering, and the
//! broadcast write.
//!
//! The service is stateless; every call validates against fresh repository
//! reads and commits the ride plus its broadcast requests in one atomic
//! write. The created fact is published only after that write commits, and a
//! sink failure never rolls the ride back.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::config::DispatchConfig;
use crate::domain::entitlement::EntitlementChecker;
use crate::domain::events::{RideCreatedEvent, RideEvent};
use crate::domain::geo::{planar_distance_km, validate_route};
use crate::domain::ids::{PassId, RideId, UserId, VehicleId};
use crate::domain::ports::{
    BoardingPassRepository, ConfirmationCodeCounter, EventSink, RideRepository,
    RideRepositoryError, UserRepository, UserRepositoryError, VehicleRepository,
    VehicleRepositoryError,
};
use crate::domain::ride::{Ride, RideLocation, RideStatus};
use crate::domain::ride_request::RideRequest;
use crate::domain::vehicle_selection::{filter_dispatchable, no_vehicles_available};
use crate::domain::{Actor, Error, Role};

fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

fn map_vehicle_repository_error(error: VehicleRepositoryError) -> Error {
    match error {
        VehicleRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("vehicle repository unavailable: {message}"))
        }
        VehicleRepositoryError::Query { message } => {
            Error::internal(format!("vehicle repository error: {message}"))
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

/// Payload for [`DispatchService::create_ride`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRideRequest {
    /// Boarding pass the ride is consumed from.
    pub boarding_pass_id: PassId,
    /// Pickup endpoint.
    pub pickup: RideLocation,
    /// Drop-off endpoint.
    pub dropoff: RideLocation,
    /// Nearby vehicles found by the caller's proximity search; re-read and
    /// re-filtered here before broadcast.
    pub candidate_vehicle_ids: Vec<VehicleId>,
}

/// Result of a successful ride creation.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRideResponse {
    /// The persisted ride, in status [`RideStatus::New`].
    pub ride: Ride,
    /// Drivers a broadcast request was created for.
    pub offered_driver_ids: Vec<UserId>,
}

/// Collaborator ports for [`DispatchService`].
#[derive(Clone)]
pub struct DispatchPorts {
    /// User account reads.
    pub users: Arc<dyn UserRepository>,
    /// Boarding pass reads and window activation.
    pub passes: Arc<dyn BoardingPassRepository>,
    /// Vehicle candidate reads.
    pub vehicles: Arc<dyn VehicleRepository>,
    /// Ride persistence.
    pub rides: Arc<dyn RideRepository>,
    /// Monotonic confirmation code source.
    pub counter: Arc<dyn ConfirmationCodeCounter>,
    /// Lifecycle fact sink.
    pub events: Arc<dyn EventSink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Creates rides and broadcasts them to candidate drivers.
#[derive(Clone)]
pub struct DispatchService {
    config: DispatchConfig,
    ports: DispatchPorts,
    entitlement: EntitlementChecker,
}

impl DispatchService {
    /// Construct the service with its configuration and collaborators.
    #[must_use]
    pub fn new(config: DispatchConfig, ports: DispatchPorts) -> Self {
        let entitlement = EntitlementChecker::new(
            Arc::clone(&ports.passes),
            Arc::clone(&ports.rides),
            Arc::clone(&ports.clock),
        );
        Self {
            config,
            ports,
            entitlement,
        }
    }

    /// Create a ride for `actor` and broadcast it to every dispatchable
    /// candidate.
    ///
    /// Validation runs before any write; a failed call leaves no state
    /// behind. The ride and its requests commit atomically so drivers never
    /// observe a ride without offers.
    pub async fn create_ride(
        &self,
        actor: &Actor,
        request: CreateRideRequest,
    ) -> Result<CreateRideResponse, Error> {
        actor.require_role(Role::Rider)?;
        self.check_account(actor).await?;

        validate_route(
            request.pickup.point,
            request.dropoff.point,
            self.config.service_zones(),
        )?;

        let pass = self
            .entitlement
            .check_and_activate(actor, request.boarding_pass_id)
            .await?;

        let candidates = self
            .ports
            .vehicles
            .find_many(&request.candidate_vehicle_ids)
            .await
            .map_err(map_vehicle_repository_error)?;
        let candidates = filter_dispatchable(candidates);
        if candidates.is_empty() {
            return Err(no_vehicles_available());
        }

        let ride_id = RideId::random();
        let confirmation_code = self.next_confirmation_code(ride_id).await;
        let now = self.ports.clock.utc();

        let ride = Ride {
            id: ride_id,
            boarding_pass_id: pass.id,
            rider_id: actor.user_id(),
            driver_id: None,
            vehicle_id: None,
            confirmation_code,
            distance_km: planar_distance_km(request.pickup.point, request.dropoff.point),
            pickup: request.pickup,
            dropoff: request.dropoff,
            status: RideStatus::New,
            requested_at: now,
            vehicle_arrived_at: None,
            started_at: None,
            ended_at: None,
            duration_minutes: None,
            route_map_file_id: None,
            cancelled_by: None,
            cancellation_reason: None,
            cancelled_at: None,
        };

        let requests: Vec<RideRequest> = candidates
            .iter()
            .filter_map(|vehicle| {
                let driver_id = vehicle.current_driver_id?;
                Some(RideRequest::open(
                    ride_id,
                    actor.user_id(),
                    driver_id,
                    vehicle.id,
                ))
            })
            .collect();

        self.ports
            .rides
            .create_with_requests(&ride, &requests)
            .await
            .map_err(map_ride_repository_error)?;

        let offered_driver_ids: Vec<UserId> =
            requests.iter().map(|request| request.driver_id).collect();
        info!(
            ride_id = %ride.id,
            offers = offered_driver_ids.len(),
            "ride created and broadcast"
        );
        self.publish_created(&ride, offered_driver_ids.clone()).await;

        Ok(CreateRideResponse {
            ride,
            offered_driver_ids,
        })
    }

    async fn check_account(&self, actor: &Actor) -> Result<(), Error> {
        let summary = self
            .ports
            .users
            .find_summary(actor.user_id())
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::not_found("rider account not found"))?;

        if summary.blocked {
            return Err(Error::forbidden("rider account is blocked")
                .with_details(json!({ "code": "account_blocked" })));
        }
        if !summary.active {
            return Err(Error::forbidden("rider account is inactive")
                .with_details(json!({ "code": "account_inactive" })));
        }
        Ok(())
    }

    /// Counter-derived code when the counter is reachable; otherwise a code
    /// derived from the ride id. A counter outage must not block dispatch.
    async fn next_confirmation_code(&self, ride_id: RideId) -> String {
        let slug = self.config.confirmation_code_slug();
        match self.ports.counter.next(slug).await {
            Ok(number) => format!("{slug}-{number}"),
            Err(error) => {
                warn!(%error, "confirmation counter unavailable, deriving code from ride id");
                let uuid = ride_id.as_uuid().simple().to_string();
                format!("{slug}-{}", &uuid[..8])
            }
        }
    }

    async fn publish_created(&self, ride: &Ride, offered_driver_ids: Vec<UserId>) {
        let event = RideEvent::RideCreated(RideCreatedEvent {
            ride: ride.clone(),
            offered_driver_ids,
        });
        if let Err(error) = self.ports.events.publish(event).await {
            warn!(%error, ride_id = %ride.id, "failed to publish ride created event");
        }
    }
}
