//! Port for vehicle reads and booking-flag writes.

use async_trait::async_trait;

use crate::domain::ids::VehicleId;
use crate::domain::vehicle::Vehicle;

use super::define_port_error;

define_port_error! {
    /// Errors raised by vehicle repository adapters.
    pub enum VehicleRepositoryError {
        /// Repository connection could not be established.
        Connection => "vehicle repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query => "vehicle repository query failed: {message}",
    }
}

/// Port for vehicle persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Find a vehicle by id.
    async fn find_by_id(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Option<Vehicle>, VehicleRepositoryError>;

    /// Fetch fresh records for a caller-supplied candidate list. Unknown ids
    /// are silently dropped.
    async fn find_many(
        &self,
        vehicle_ids: &[VehicleId],
    ) -> Result<Vec<Vehicle>, VehicleRepositoryError>;

    /// Set the booking flag. Returns `Ok(None)` when the vehicle is missing.
    async fn set_booked(
        &self,
        vehicle_id: VehicleId,
        booked: bool,
    ) -> Result<Option<Vehicle>, VehicleRepositoryError>;
}

/// Fixture implementation for tests that do not exercise vehicle persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVehicleRepository;

#[async_trait]
impl VehicleRepository for FixtureVehicleRepository {
    async fn find_by_id(
        &self,
        _vehicle_id: VehicleId,
    ) -> Result<Option<Vehicle>, VehicleRepositoryError> {
        Ok(None)
    }

    async fn find_many(
        &self,
        _vehicle_ids: &[VehicleId],
    ) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
        Ok(Vec::new())
    }

    async fn set_booked(
        &self,
        _vehicle_id: VehicleId,
        _booked: bool,
    ) -> Result<Option<Vehicle>, VehicleRepositoryError> {
        Ok(None)
    }
}
