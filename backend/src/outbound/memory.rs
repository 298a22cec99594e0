//! In-memory persistence adapter.
//!
//! Backs the engine's repository ports with hash maps behind a single
//! mutex, so every conditional write holds the whole store for the duration
//! of its check and mutation. That gives the same atomicity the ports
//! demand from a database adapter, which makes this store the reference
//! implementation for the concurrency contract in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::boarding_pass::BoardingPass;
use crate::domain::ids::{PassId, RideId, RideRequestId, UserId, VehicleId};
use crate::domain::ports::{
    ActivationOutcome, AssignDriverOutcome, BoardingPassRepository, BoardingPassRepositoryError,
    ConfirmationCodeCounter, ConfirmationCounterError, DriverAssignment, RideRepository,
    RideRepositoryError, RideRequestRepository, RideRequestRepositoryError, RideTransition,
    TransitionOutcome, UserRepository, UserRepositoryError, VehicleRepository,
    VehicleRepositoryError,
};
use crate::domain::ride::{Ride, RideStatus};
use crate::domain::ride_request::RideRequest;
use crate::domain::vehicle::Vehicle;
use crate::domain::UserSummary;

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<UserId, UserSummary>,
    passes: HashMap<PassId, BoardingPass>,
    vehicles: HashMap<VehicleId, Vehicle>,
    rides: HashMap<RideId, Ride>,
    requests: HashMap<RideRequestId, RideRequest>,
}

/// Hash-map store implementing every repository port.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a user account.
    pub fn seed_user(&self, user: UserSummary) {
        self.state().users.insert(user.id, user);
    }

    /// Insert or replace a boarding pass.
    pub fn seed_pass(&self, pass: BoardingPass) {
        self.state().passes.insert(pass.id, pass);
    }

    /// Insert or replace a vehicle.
    pub fn seed_vehicle(&self, vehicle: Vehicle) {
        self.state().vehicles.insert(vehicle.id, vehicle);
    }

    /// Stored ride, if any.
    #[must_use]
    pub fn ride(&self, ride_id: RideId) -> Option<Ride> {
        self.state().rides.get(&ride_id).cloned()
    }

    /// Stored vehicle, if any.
    #[must_use]
    pub fn vehicle(&self, vehicle_id: VehicleId) -> Option<Vehicle> {
        self.state().vehicles.get(&vehicle_id).cloned()
    }

    /// Stored boarding pass, if any.
    #[must_use]
    pub fn pass(&self, pass_id: PassId) -> Option<BoardingPass> {
        self.state().passes.get(&pass_id).cloned()
    }

    /// All requests broadcast for a ride.
    #[must_use]
    pub fn requests_for_ride(&self, ride_id: RideId) -> Vec<RideRequest> {
        self.state()
            .requests
            .values()
            .filter(|request| request.ride_id == ride_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_summary(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserSummary>, UserRepositoryError> {
        Ok(self.state().users.get(&user_id).cloned())
    }
}

#[async_trait]
impl BoardingPassRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        pass_id: PassId,
    ) -> Result<Option<BoardingPass>, BoardingPassRepositoryError> {
        Ok(self.state().passes.get(&pass_id).cloned())
    }

    async fn activate_validity_window(
        &self,
        pass_id: PassId,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    ) -> Result<Option<ActivationOutcome>, BoardingPassRepositoryError> {
        let mut state = self.state();
        let Some(pass) = state.passes.get_mut(&pass_id) else {
            return Ok(None);
        };

        // The update only applies while both bounds are still unset; a
        // second concurrent activation observes the stored window instead.
        if pass.valid_from.is_some() || pass.valid_to.is_some() {
            return Ok(Some(ActivationOutcome::AlreadyActivated(pass.clone())));
        }
        pass.valid_from = Some(valid_from);
        pass.valid_to = Some(valid_to);
        Ok(Some(ActivationOutcome::Activated(pass.clone())))
    }
}

#[async_trait]
impl VehicleRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Option<Vehicle>, VehicleRepositoryError> {
        Ok(self.state().vehicles.get(&vehicle_id).cloned())
    }

    async fn find_many(
        &self,
        vehicle_ids: &[VehicleId],
    ) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
        let state = self.state();
        Ok(vehicle_ids
            .iter()
            .filter_map(|id| state.vehicles.get(id).cloned())
            .collect())
    }

    async fn set_booked(
        &self,
        vehicle_id: VehicleId,
        booked: bool,
    ) -> Result<Option<Vehicle>, VehicleRepositoryError> {
        let mut state = self.state();
        let Some(vehicle) = state.vehicles.get_mut(&vehicle_id) else {
            return Ok(None);
        };
        vehicle.booked = booked;
        Ok(Some(vehicle.clone()))
    }
}

#[async_trait]
impl RideRequestRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        request_id: RideRequestId,
    ) -> Result<Option<RideRequest>, RideRequestRepositoryError> {
        Ok(self.state().requests.get(&request_id).cloned())
    }

    async fn list_for_ride(
        &self,
        ride_id: RideId,
    ) -> Result<Vec<RideRequest>, RideRequestRepositoryError> {
        Ok(self.requests_for_ride(ride_id))
    }

    async fn mark_rejected(
        &self,
        request_id: RideRequestId,
        rejected_at: DateTime<Utc>,
    ) -> Result<Option<RideRequest>, RideRequestRepositoryError> {
        let mut state = self.state();
        let Some(request) = state.requests.get_mut(&request_id) else {
            return Ok(None);
        };
        request.is_rejected = true;
        request.rejected_at = Some(rejected_at);
        Ok(Some(request.clone()))
    }
}

#[async_trait]
impl RideRepository for InMemoryStore {
    async fn create_with_requests(
        &self,
        ride: &Ride,
        requests: &[RideRequest],
    ) -> Result<(), RideRepositoryError> {
        let mut state = self.state();
        state.rides.insert(ride.id, ride.clone());
        for request in requests {
            state.requests.insert(request.id, request.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, ride_id: RideId) -> Result<Option<Ride>, RideRepositoryError> {
        Ok(self.state().rides.get(&ride_id).cloned())
    }

    async fn count_quota_consuming(
        &self,
        pass_id: PassId,
        since: Option<DateTime<Utc>>,
    ) -> Result<u64, RideRepositoryError> {
        let count = self
            .state()
            .rides
            .values()
            .filter(|ride| {
                ride.boarding_pass_id == pass_id
                    && ride.status.counts_against_quota()
                    && since.is_none_or(|cutoff| ride.requested_at >= cutoff)
            })
            .count();
        Ok(count as u64)
    }

    async fn count_all_for_pass(&self, pass_id: PassId) -> Result<u64, RideRepositoryError> {
        let count = self
            .state()
            .rides
            .values()
            .filter(|ride| ride.boarding_pass_id == pass_id)
            .count();
        Ok(count as u64)
    }

    async fn try_assign_driver(
        &self,
        assignment: DriverAssignment,
    ) -> Result<AssignDriverOutcome, RideRepositoryError> {
        let mut state = self.state();
        let Some(ride) = state.rides.get_mut(&assignment.ride_id) else {
            return Err(RideRepositoryError::query(format!(
                "ride {} not found for assignment",
                assignment.ride_id
            )));
        };

        // The precondition and every dependent write happen under one lock,
        // so exactly one concurrent caller can observe the NULL driver.
        if ride.driver_id.is_some() || ride.status != RideStatus::New {
            return Ok(AssignDriverOutcome::Lost { ride: ride.clone() });
        }

        ride.driver_id = Some(assignment.driver_id);
        ride.vehicle_id = Some(assignment.vehicle_id);
        ride.status = RideStatus::Assigned;
        let ride = ride.clone();

        let mut accepted = None;
        for request in state
            .requests
            .values_mut()
            .filter(|request| request.ride_id == assignment.ride_id)
        {
            if request.id == assignment.request_id {
                request.is_accepted = true;
                request.accepted_at = Some(assignment.accepted_at);
                request.eta = Some(assignment.eta);
                accepted = Some(request.clone());
            } else {
                request.available = false;
            }
        }
        let Some(request) = accepted else {
            return Err(RideRepositoryError::query(format!(
                "ride request {} not found for assignment",
                assignment.request_id
            )));
        };

        if let Some(vehicle) = state.vehicles.get_mut(&assignment.vehicle_id) {
            vehicle.booked = true;
        }

        Ok(AssignDriverOutcome::Assigned { ride, request })
    }

    async fn apply_transition(
        &self,
        ride_id: RideId,
        expected_status: RideStatus,
        transition: RideTransition,
    ) -> Result<Option<TransitionOutcome>, RideRepositoryError> {
        let mut state = self.state();
        let Some(ride) = state.rides.get_mut(&ride_id) else {
            return Ok(None);
        };
        if ride.status != expected_status {
            return Ok(Some(TransitionOutcome::Conflict(ride.clone())));
        }

        let mut release_vehicle = None;
        match transition {
            RideTransition::VehicleArrived { at } => {
                ride.vehicle_arrived_at = Some(at);
            }
            RideTransition::Start { at } => {
                ride.status = RideStatus::InProgress;
                ride.started_at = Some(at);
            }
            RideTransition::Complete {
                at,
                duration_minutes,
                route_map_file_id,
            } => {
                ride.status = RideStatus::Complete;
                ride.ended_at = Some(at);
                ride.duration_minutes = Some(duration_minutes);
                ride.route_map_file_id = route_map_file_id;
                release_vehicle = ride.vehicle_id;
            }
            RideTransition::Cancel { by, reason, at } => {
                ride.status = RideStatus::Canceled;
                ride.cancelled_by = Some(by);
                ride.cancellation_reason = Some(reason);
                ride.cancelled_at = Some(at);
                release_vehicle = ride.vehicle_id;
            }
        }
        let ride = ride.clone();

        if let Some(vehicle_id) = release_vehicle {
            if let Some(vehicle) = state.vehicles.get_mut(&vehicle_id) {
                vehicle.booked = false;
            }
        }

        Ok(Some(TransitionOutcome::Applied(ride)))
    }
}

/// In-process monotonic per-slug counter.
#[derive(Debug, Default)]
pub struct MonotonicCounter {
    counts: Mutex<HashMap<String, u64>>,
}

impl MonotonicCounter {
    /// Create a counter with every slug at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfirmationCodeCounter for MonotonicCounter {
    async fn next(&self, slug: &str) -> Result<u64, ConfirmationCounterError> {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counts.entry(slug.to_owned()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
