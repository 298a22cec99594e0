//! Ride lifecycle operations after assignment: arrival, start, complete,
//! cancel.
//!
//! Each operation validates the caller and the ride's current status before
//! a conditional repository write keyed on that status, so a concurrent
//! transition surfaces as a conflict instead of a lost update.
//! Authorization failures and invalid-state failures are reported as
//! distinct error codes; neither is retried.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::events::{
    RideCancelledEvent, RideCompletedEvent, RideEvent, RideStartedEvent, VehicleArrivedEvent,
};
use crate::domain::ids::{RideId, VehicleId};
use crate::domain::ports::{
    EventSink, RideRepository, RideRepositoryError, RideTransition, TransitionOutcome,
    UserRepository, UserRepositoryError,
};
use crate::domain::ride::{Ride, RideStatus};
use crate::domain::{Actor, Error, Role};

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

fn ride_not_found(ride_id: RideId) -> Error {
    Error::not_found(format!("ride {ride_id} not found"))
        .with_details(json!({ "code": "ride_not_found" }))
}

fn invalid_status(ride: &Ride, operation: &str) -> Error {
    Error::state_conflict(format!(
        "cannot {operation} a ride in status {}",
        ride.status.as_str()
    ))
    .with_details(json!({
        "code": "invalid_status",
        "status": ride.status.as_str(),
    }))
}

/// Result of [`LifecycleService::vehicle_arrived`].
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleArrivedResponse {
    /// The ride, with `vehicle_arrived_at` recorded.
    pub ride: Ride,
}

/// Result of [`LifecycleService::start`].
#[derive(Debug, Clone, PartialEq)]
pub struct StartRideResponse {
    /// The ride, now in progress.
    pub ride: Ride,
}

/// Result of [`LifecycleService::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteRideResponse {
    /// The completed ride, with its duration recorded.
    pub ride: Ride,
}

/// Result of [`LifecycleService::cancel`].
#[derive(Debug, Clone, PartialEq)]
pub struct CancelRideResponse {
    /// The cancelled ride.
    pub ride: Ride,
}

/// Collaborator ports for [`LifecycleService`].
#[derive(Clone)]
pub struct LifecyclePorts {
    /// Ride reads and conditional transition writes.
    pub rides: Arc<dyn RideRepository>,
    /// Driver account reads.
    pub users: Arc<dyn UserRepository>,
    /// Lifecycle fact sink.
    pub events: Arc<dyn EventSink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Drives assigned rides through arrival, start, completion, and
/// cancellation.
#[derive(Clone)]
pub struct LifecycleService {
    ports: LifecyclePorts,
}

impl LifecycleService {
    /// Construct the service with its collaborators.
    #[must_use]
    pub fn new(ports: LifecyclePorts) -> Self {
        Self { ports }
    }

    /// Record that the assigned vehicle arrived at pickup.
    ///
    /// Legal only while the ride is [`RideStatus::Assigned`]; the status
    /// does not change.
    pub async fn vehicle_arrived(
        &self,
        actor: &Actor,
        ride_id: RideId,
        vehicle_id: VehicleId,
    ) -> Result<VehicleArrivedResponse, Error> {
        let ride = self.load_for_assigned_driver(actor, ride_id).await?;
        if ride.status != RideStatus::Assigned {
            return Err(invalid_status(&ride, "mark arrival for"));
        }
        check_vehicle_matches(&ride, vehicle_id)?;

        let ride = self
            .transition(
                ride_id,
                RideStatus::Assigned,
                RideTransition::VehicleArrived {
                    at: self.ports.clock.utc(),
                },
                "mark arrival for",
            )
            .await?;

        self.publish(RideEvent::VehicleArrived(VehicleArrivedEvent {
            ride: ride.clone(),
        }))
        .await;
        Ok(VehicleArrivedResponse { ride })
    }

    /// Start the trip.
    ///
    /// The caller must present the rider's confirmation code; a mismatch is
    /// a validation failure and leaves the ride [`RideStatus::Assigned`].
    pub async fn start(
        &self,
        actor: &Actor,
        ride_id: RideId,
        vehicle_id: VehicleId,
        confirmation_code: &str,
    ) -> Result<StartRideResponse, Error> {
        let ride = self.load_for_assigned_driver(actor, ride_id).await?;
        if ride.status != RideStatus::Assigned {
            return Err(invalid_status(&ride, "start"));
        }
        check_vehicle_matches(&ride, vehicle_id)?;
        if ride.confirmation_code != confirmation_code {
            return Err(Error::invalid_request("confirmation code does not match")
                .with_details(json!({ "code": "confirmation_code_mismatch" })));
        }

        let ride = self
            .transition(
                ride_id,
                RideStatus::Assigned,
                RideTransition::Start {
                    at: self.ports.clock.utc(),
                },
                "start",
            )
            .await?;

        info!(ride_id = %ride.id, "ride started");
        self.publish(RideEvent::RideStarted(RideStartedEvent {
            ride: ride.clone(),
        }))
        .await;
        Ok(StartRideResponse { ride })
    }

    /// Complete the trip, recording its duration in whole minutes.
    pub async fn complete(
        &self,
        actor: &Actor,
        ride_id: RideId,
        route_map_file_id: Option<String>,
    ) -> Result<CompleteRideResponse, Error> {
        let ride = self.load_for_assigned_driver(actor, ride_id).await?;
        if ride.status != RideStatus::InProgress {
            return Err(invalid_status(&ride, "complete"));
        }
        let Some(started_at) = ride.started_at else {
            return Err(Error::internal(format!(
                "ride {ride_id} is in progress without a start timestamp"
            )));
        };

        let now = self.ports.clock.utc();
        let duration_minutes = (now - started_at).num_minutes();
        let ride = self
            .transition(
                ride_id,
                RideStatus::InProgress,
                RideTransition::Complete {
                    at: now,
                    duration_minutes,
                    route_map_file_id,
                },
                "complete",
            )
            .await?;

        info!(ride_id = %ride.id, duration_minutes, "ride completed");
        self.publish(RideEvent::RideCompleted(RideCompletedEvent {
            ride: ride.clone(),
        }))
        .await;
        Ok(CompleteRideResponse { ride })
    }

    /// Cancel a ride on behalf of its rider or its assigned driver.
    ///
    /// Legal from any non-terminal status. The repository releases the
    /// assigned vehicle, if any, in the same atomic write.
    pub async fn cancel(
        &self,
        actor: &Actor,
        ride_id: RideId,
        reason: impl Into<String>,
    ) -> Result<CancelRideResponse, Error> {
        actor.require_one_of(&[Role::Rider, Role::Driver])?;

        let ride = self.load(ride_id).await?;
        match actor.role() {
            Role::Rider if ride.rider_id == actor.user_id() => {}
            Role::Driver if ride.driver_id == Some(actor.user_id()) => {}
            _ => {
                return Err(Error::forbidden("ride belongs to a different user")
                    .with_details(json!({ "code": "not_authorized" })));
            }
        }
        if !ride.status.can_transition_to(RideStatus::Canceled) {
            return Err(invalid_status(&ride, "cancel"));
        }

        let now = self.ports.clock.utc();
        let ride = self
            .transition(
                ride_id,
                ride.status,
                RideTransition::Cancel {
                    by: actor.user_id(),
                    reason: reason.into(),
                    at: now,
                },
                "cancel",
            )
            .await?;

        info!(ride_id = %ride.id, cancelled_by = %actor.user_id(), "ride cancelled");
        self.publish(RideEvent::RideCancelled(RideCancelledEvent {
            ride: ride.clone(),
            cancelled_by: actor.user_id(),
            cancelled_at: now,
        }))
        .await;
        Ok(CancelRideResponse { ride })
    }

    async fn load(&self, ride_id: RideId) -> Result<Ride, Error> {
        self.ports
            .rides
            .find_by_id(ride_id)
            .await
            .map_err(map_ride_repository_error)?
            .ok_or_else(|| ride_not_found(ride_id))
    }

    /// Load the ride and require the caller to be its assigned, active,
    /// unblocked driver.
    async fn load_for_assigned_driver(
        &self,
        actor: &Actor,
        ride_id: RideId,
    ) -> Result<Ride, Error> {
        actor.require_role(Role::Driver)?;

        let ride = self.load(ride_id).await?;
        if ride.driver_id != Some(actor.user_id()) {
            return Err(Error::forbidden("ride is assigned to a different driver")
                .with_details(json!({ "code": "not_authorized" })));
        }

        let summary = self
            .ports
            .users
            .find_summary(actor.user_id())
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::not_found("driver account not found"))?;
        if !summary.may_drive() {
            return Err(Error::forbidden("driver account is inactive or blocked")
                .with_details(json!({ "code": "driver_not_eligible" })));
        }
        Ok(ride)
    }

    async fn transition(
        &self,
        ride_id: RideId,
        expected_status: RideStatus,
        transition: RideTransition,
        operation: &str,
    ) -> Result<Ride, Error> {
        let outcome = self
            .ports
            .rides
            .apply_transition(ride_id, expected_status, transition)
            .await
            .map_err(map_ride_repository_error)?
            .ok_or_else(|| ride_not_found(ride_id))?;

        match outcome {
            TransitionOutcome::Applied(ride) => Ok(ride),
            TransitionOutcome::Conflict(ride) => Err(invalid_status(&ride, operation)),
        }
    }

    async fn publish(&self, event: RideEvent) {
        let name = event.name();
        if let Err(error) = self.ports.events.publish(event).await {
            warn!(%error, event = name, "failed to publish lifecycle event");
        }
    }
}

fn check_vehicle_matches(ride: &Ride, vehicle_id: VehicleId) -> Result<(), Error> {
    if ride.vehicle_id == Some(vehicle_id) {
        Ok(())
    } else {
        Err(Error::invalid_request("vehicle does not match the assignment")
            .with_details(json!({ "code": "vehicle_mismatch" })))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use chrono::{DateTime, Duration, Local, TimeZone, Utc};

    use super::*;
    use crate::domain::geo::GeoPoint;
    use crate::domain::ids::{PassId, UserId};
    use crate::domain::ports::{MockEventSink, MockRideRepository, MockUserRepository};
    use crate::domain::ride::RideLocation;
    use crate::domain::{ErrorCode, UserSummary};

    struct FixtureClock {
        utc_now: DateTime<Utc>,
    }

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc_now.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.utc_now
        }
    }

    fn fixture_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    fn location() -> RideLocation {
        RideLocation {
            address: "1 Vitosha Blvd".into(),
            point: GeoPoint::new(42.6977, 23.3219),
        }
    }

    fn assigned_ride(driver_id: UserId, vehicle_id: VehicleId) -> Ride {
        Ride {
            id: RideId::random(),
            boarding_pass_id: PassId::random(),
            rider_id: UserId::random(),
            driver_id: Some(driver_id),
            vehicle_id: Some(vehicle_id),
            confirmation_code: "ride-9".into(),
            pickup: location(),
            dropoff: location(),
            distance_km: 3.2,
            status: RideStatus::Assigned,
            requested_at: fixture_now() - Duration::minutes(10),
            vehicle_arrived_at: None,
            started_at: None,
            ended_at: None,
            duration_minutes: None,
            route_map_file_id: None,
            cancelled_by: None,
            cancellation_reason: None,
            cancelled_at: None,
        }
    }

    struct Fixture {
        rides: MockRideRepository,
        users: MockUserRepository,
        events: MockEventSink,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                rides: MockRideRepository::new(),
                users: MockUserRepository::new(),
                events: MockEventSink::new(),
            }
        }

        fn with_eligible_driver(mut self, driver_id: UserId) -> Self {
            self.users.expect_find_summary().returning(move |_| {
                Ok(Some(UserSummary {
                    id: driver_id,
                    active: true,
                    blocked: false,
                }))
            });
            self
        }

        fn into_service(self) -> LifecycleService {
            LifecycleService::new(LifecyclePorts {
                rides: Arc::new(self.rides),
                users: Arc::new(self.users),
                events: Arc::new(self.events),
                clock: Arc::new(FixtureClock {
                    utc_now: fixture_now(),
                }),
            })
        }
    }

    fn driver(driver_id: UserId) -> Actor {
        Actor::new(driver_id, Role::Driver)
    }

    #[tokio::test]
    async fn arrival_records_the_timestamp_without_changing_status() {
        let driver_id = UserId::random();
        let vehicle_id = VehicleId::random();
        let ride = assigned_ride(driver_id, vehicle_id);
        let ride_id = ride.id;

        let mut arrived = ride.clone();
        arrived.vehicle_arrived_at = Some(fixture_now());

        let mut fixture = Fixture::new().with_eligible_driver(driver_id);
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));
        fixture
            .rides
            .expect_apply_transition()
            .withf(move |id, expected, transition| {
                *id == ride_id
                    && *expected == RideStatus::Assigned
                    && matches!(transition, RideTransition::VehicleArrived { .. })
            })
            .times(1)
            .return_once(move |_, _, _| Ok(Some(TransitionOutcome::Applied(arrived))));
        fixture
            .events
            .expect_publish()
            .withf(|event| matches!(event, RideEvent::VehicleArrived(_)))
            .times(1)
            .return_once(|_| Ok(()));

        let response = fixture
            .into_service()
            .vehicle_arrived(&driver(driver_id), ride_id, vehicle_id)
            .await
            .expect("arrival recorded");
        assert_eq!(response.ride.status, RideStatus::Assigned);
        assert_eq!(response.ride.vehicle_arrived_at, Some(fixture_now()));
    }

    #[tokio::test]
    async fn unassigned_driver_may_not_report_arrival() {
        let ride = assigned_ride(UserId::random(), VehicleId::random());
        let ride_id = ride.id;
        let vehicle_id = ride.vehicle_id.expect("assigned vehicle");

        let mut fixture = Fixture::new();
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));

        let err = fixture
            .into_service()
            .vehicle_arrived(&driver(UserId::random()), ride_id, vehicle_id)
            .await
            .expect_err("foreign driver");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn blocked_driver_is_refused() {
        let driver_id = UserId::random();
        let vehicle_id = VehicleId::random();
        let ride = assigned_ride(driver_id, vehicle_id);
        let ride_id = ride.id;

        let mut fixture = Fixture::new();
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));
        fixture.users.expect_find_summary().returning(move |_| {
            Ok(Some(UserSummary {
                id: driver_id,
                active: true,
                blocked: true,
            }))
        });

        let err = fixture
            .into_service()
            .vehicle_arrived(&driver(driver_id), ride_id, vehicle_id)
            .await
            .expect_err("blocked driver");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn mismatched_vehicle_is_a_validation_failure() {
        let driver_id = UserId::random();
        let ride = assigned_ride(driver_id, VehicleId::random());
        let ride_id = ride.id;

        let mut fixture = Fixture::new().with_eligible_driver(driver_id);
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));

        let err = fixture
            .into_service()
            .vehicle_arrived(&driver(driver_id), ride_id, VehicleId::random())
            .await
            .expect_err("wrong vehicle");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn wrong_confirmation_code_leaves_the_ride_assigned() {
        let driver_id = UserId::random();
        let vehicle_id = VehicleId::random();
        let ride = assigned_ride(driver_id, vehicle_id);
        let ride_id = ride.id;

        let mut fixture = Fixture::new().with_eligible_driver(driver_id);
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));

        let err = fixture
            .into_service()
            .start(&driver(driver_id), ride_id, vehicle_id, "ride-999")
            .await
            .expect_err("wrong code");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn matching_code_starts_the_trip() {
        let driver_id = UserId::random();
        let vehicle_id = VehicleId::random();
        let ride = assigned_ride(driver_id, vehicle_id);
        let ride_id = ride.id;

        let mut started = ride.clone();
        started.status = RideStatus::InProgress;
        started.started_at = Some(fixture_now());

        let mut fixture = Fixture::new().with_eligible_driver(driver_id);
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));
        fixture
            .rides
            .expect_apply_transition()
            .withf(|_, expected, transition| {
                *expected == RideStatus::Assigned
                    && matches!(transition, RideTransition::Start { .. })
            })
            .times(1)
            .return_once(move |_, _, _| Ok(Some(TransitionOutcome::Applied(started))));
        fixture
            .events
            .expect_publish()
            .withf(|event| matches!(event, RideEvent::RideStarted(_)))
            .times(1)
            .return_once(|_| Ok(()));

        let response = fixture
            .into_service()
            .start(&driver(driver_id), ride_id, vehicle_id, "ride-9")
            .await
            .expect("trip started");
        assert_eq!(response.ride.status, RideStatus::InProgress);
    }

    #[tokio::test]
    async fn completion_records_the_duration_in_minutes() {
        let driver_id = UserId::random();
        let vehicle_id = VehicleId::random();
        let mut ride = assigned_ride(driver_id, vehicle_id);
        ride.status = RideStatus::InProgress;
        ride.started_at = Some(fixture_now() - Duration::minutes(23));
        let ride_id = ride.id;

        let mut completed = ride.clone();
        completed.status = RideStatus::Complete;
        completed.ended_at = Some(fixture_now());
        completed.duration_minutes = Some(23);

        let mut fixture = Fixture::new().with_eligible_driver(driver_id);
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));
        fixture
            .rides
            .expect_apply_transition()
            .withf(|_, expected, transition| {
                *expected == RideStatus::InProgress
                    && matches!(
                        transition,
                        RideTransition::Complete {
                            duration_minutes: 23,
                            ..
                        }
                    )
            })
            .times(1)
            .return_once(move |_, _, _| Ok(Some(TransitionOutcome::Applied(completed))));
        fixture
            .events
            .expect_publish()
            .withf(|event| matches!(event, RideEvent::RideCompleted(_)))
            .times(1)
            .return_once(|_| Ok(()));

        let response = fixture
            .into_service()
            .complete(&driver(driver_id), ride_id, None)
            .await
            .expect("trip completed");
        assert_eq!(response.ride.duration_minutes, Some(23));
    }

    #[tokio::test]
    async fn rider_cancels_their_own_ride() {
        let driver_id = UserId::random();
        let ride = assigned_ride(driver_id, VehicleId::random());
        let ride_id = ride.id;
        let rider_id = ride.rider_id;

        let mut cancelled = ride.clone();
        cancelled.status = RideStatus::Canceled;
        cancelled.cancelled_by = Some(rider_id);
        cancelled.cancellation_reason = Some("change of plans".to_owned());
        cancelled.cancelled_at = Some(fixture_now());

        let mut fixture = Fixture::new();
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));
        fixture
            .rides
            .expect_apply_transition()
            .withf(move |_, expected, transition| {
                *expected == RideStatus::Assigned
                    && matches!(
                        transition,
                        RideTransition::Cancel { by, .. } if *by == rider_id
                    )
            })
            .times(1)
            .return_once(move |_, _, _| Ok(Some(TransitionOutcome::Applied(cancelled))));
        fixture
            .events
            .expect_publish()
            .withf(|event| matches!(event, RideEvent::RideCancelled(_)))
            .times(1)
            .return_once(|_| Ok(()));

        let response = fixture
            .into_service()
            .cancel(&Actor::new(rider_id, Role::Rider), ride_id, "change of plans")
            .await
            .expect("ride cancelled");
        assert_eq!(response.ride.status, RideStatus::Canceled);
        assert_eq!(response.ride.cancelled_by, Some(rider_id));
    }

    #[tokio::test]
    async fn foreign_rider_may_not_cancel() {
        let ride = assigned_ride(UserId::random(), VehicleId::random());
        let ride_id = ride.id;

        let mut fixture = Fixture::new();
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));

        let err = fixture
            .into_service()
            .cancel(&Actor::new(UserId::random(), Role::Rider), ride_id, "nope")
            .await
            .expect_err("foreign rider");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn back_office_roles_may_not_cancel() {
        let service = Fixture::new().into_service();

        let err = service
            .cancel(
                &Actor::new(UserId::random(), Role::Sales),
                RideId::random(),
                "refund",
            )
            .await
            .expect_err("back office role");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn completed_ride_cannot_be_cancelled() {
        let driver_id = UserId::random();
        let mut ride = assigned_ride(driver_id, VehicleId::random());
        ride.status = RideStatus::Complete;
        let ride_id = ride.id;
        let rider_id = ride.rider_id;

        let mut fixture = Fixture::new();
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));

        let err = fixture
            .into_service()
            .cancel(&Actor::new(rider_id, Role::Rider), ride_id, "too late")
            .await
            .expect_err("terminal status");
        assert_eq!(err.code(), ErrorCode::StateConflict);
    }

    #[tokio::test]
    async fn concurrent_transition_surfaces_as_conflict() {
        let driver_id = UserId::random();
        let vehicle_id = VehicleId::random();
        let ride = assigned_ride(driver_id, vehicle_id);
        let ride_id = ride.id;

        let mut cancelled = ride.clone();
        cancelled.status = RideStatus::Canceled;

        let mut fixture = Fixture::new().with_eligible_driver(driver_id);
        fixture
            .rides
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(ride)));
        fixture
            .rides
            .expect_apply_transition()
            .return_once(move |_, _, _| Ok(Some(TransitionOutcome::Conflict(cancelled))));

        let err = fixture
            .into_service()
            .start(&driver(driver_id), ride_id, vehicle_id, "ride-9")
            .await
            .expect_err("lost to a concurrent cancel");
        assert_eq!(err.code(), ErrorCode::StateConflict);
    }
}
