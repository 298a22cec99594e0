//! Port for boarding pass reads and the one-time validity window activation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::boarding_pass::BoardingPass;
use crate::domain::ids::PassId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by boarding pass repository adapters.
    pub enum BoardingPassRepositoryError {
        /// Repository connection could not be established.
        Connection => "boarding pass repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query => "boarding pass repository query failed: {message}",
    }
}

/// Outcome of a conditional validity window activation.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    /// This call activated the window; the pass now carries the bounds.
    Activated(BoardingPass),
    /// A concurrent activation got there first; the stored bounds win and the
    /// returned pass carries them.
    AlreadyActivated(BoardingPass),
}

impl ActivationOutcome {
    /// The pass after the activation attempt, whoever won.
    #[must_use]
    pub fn into_pass(self) -> BoardingPass {
        match self {
            Self::Activated(pass) | Self::AlreadyActivated(pass) => pass,
        }
    }
}

/// Port for boarding pass persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardingPassRepository: Send + Sync {
    /// Find a pass by id.
    async fn find_by_id(
        &self,
        pass_id: PassId,
    ) -> Result<Option<BoardingPass>, BoardingPassRepositoryError>;

    /// Conditionally set the validity window, requiring both bounds to still
    /// be null in the same atomic update.
    ///
    /// Adapters must guarantee that exactly one of two concurrent calls
    /// observes [`ActivationOutcome::Activated`]; the other sees
    /// [`ActivationOutcome::AlreadyActivated`] with the first caller's
    /// bounds. Returns `Ok(None)` when the pass does not exist.
    async fn activate_validity_window(
        &self,
        pass_id: PassId,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    ) -> Result<Option<ActivationOutcome>, BoardingPassRepositoryError>;
}

/// Fixture implementation for tests that do not exercise pass persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBoardingPassRepository;

#[async_trait]
impl BoardingPassRepository for FixtureBoardingPassRepository {
    async fn find_by_id(
        &self,
        _pass_id: PassId,
    ) -> Result<Option<BoardingPass>, BoardingPassRepositoryError> {
        Ok(None)
    }

    async fn activate_validity_window(
        &self,
        _pass_id: PassId,
        _valid_from: DateTime<Utc>,
        _valid_to: DateTime<Utc>,
    ) -> Result<Option<ActivationOutcome>, BoardingPassRepositoryError> {
        Ok(None)
    }
}
