//! Port for account-flag reads guarding driver-side operations.

use async_trait::async_trait;

use crate::domain::actor::UserSummary;
use crate::domain::ids::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query => "user repository query failed: {message}",
    }
}

/// Port for user account reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Read the active/blocked flags for an account.
    async fn find_summary(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserSummary>, UserRepositoryError>;
}

/// Fixture implementation for tests that do not exercise account reads.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_summary(
        &self,
        _user_id: UserId,
    ) -> Result<Option<UserSummary>, UserRepositoryError> {
        Ok(None)
    }
}
