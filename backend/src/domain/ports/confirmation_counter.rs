//! Port for the monotonic confirmation-code counter.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by counter adapters.
    pub enum ConfirmationCounterError {
        /// The counter service could not be reached.
        Unavailable => "confirmation counter unavailable: {message}",
    }
}

/// Port for allocating human-readable ride confirmation numbers.
///
/// Increments are atomic at the store level; callers need no local
/// coordination and two calls never observe the same value for a slug.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfirmationCodeCounter: Send + Sync {
    /// Allocate the next value for `slug`.
    async fn next(&self, slug: &str) -> Result<u64, ConfirmationCounterError>;
}

/// Fixture counter that always allocates `1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureConfirmationCodeCounter;

#[async_trait]
impl ConfirmationCodeCounter for FixtureConfirmationCodeCounter {
    async fn next(&self, _slug: &str) -> Result<u64, ConfirmationCounterError> {
        Ok(1)
    }
}
