//! Port for ride request reads and driver rejections.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ids::{RideId, RideRequestId};
use crate::domain::ride_request::RideRequest;

use super::define_port_error;

define_port_error! {
    /// Errors raised by ride request repository adapters.
    pub enum RideRequestRepositoryError {
        /// Repository connection could not be established.
        Connection => "ride request repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query => "ride request repository query failed: {message}",
    }
}

/// Port for ride request persistence.
///
/// Requests are created in bulk through
/// [`RideRepository::create_with_requests`](super::RideRepository::create_with_requests)
/// and accepted through
/// [`RideRepository::try_assign_driver`](super::RideRepository::try_assign_driver);
/// this port covers the remaining reads and the rejection write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RideRequestRepository: Send + Sync {
    /// Find a request by id.
    async fn find_by_id(
        &self,
        request_id: RideRequestId,
    ) -> Result<Option<RideRequest>, RideRequestRepositoryError>;

    /// All requests broadcast for a ride.
    async fn list_for_ride(
        &self,
        ride_id: RideId,
    ) -> Result<Vec<RideRequest>, RideRequestRepositoryError>;

    /// Mark a request rejected, stamping `rejected_at`.
    /// Returns `Ok(None)` when the request does not exist.
    async fn mark_rejected(
        &self,
        request_id: RideRequestId,
        rejected_at: DateTime<Utc>,
    ) -> Result<Option<RideRequest>, RideRequestRepositoryError>;
}

/// Fixture implementation for tests that do not exercise request persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRideRequestRepository;

#[async_trait]
impl RideRequestRepository for FixtureRideRequestRepository {
    async fn find_by_id(
        &self,
        _request_id: RideRequestId,
    ) -> Result<Option<RideRequest>, RideRequestRepositoryError> {
        Ok(None)
    }

    async fn list_for_ride(
        &self,
        _ride_id: RideId,
    ) -> Result<Vec<RideRequest>, RideRequestRepositoryError> {
        Ok(Vec::new())
    }

    async fn mark_rejected(
        &self,
        _request_id: RideRequestId,
        _rejected_at: DateTime<Utc>,
    ) -> Result<Option<RideRequest>, RideRequestRepositoryError> {
        Ok(None)
    }
}
