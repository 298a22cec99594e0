//! Boarding pass entitlement checks and one-time window activation.
//!
//! The checks run as an ordered ladder, each a hard stop: existence,
//! ownership, lazy validity-window activation, window bounds, then quota.
//! "Validity not started" is fatal at ride creation, keeping the policy
//! consistent with the rest of the platform.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use mockable::Clock;
use serde_json::json;

use crate::domain::boarding_pass::{BoardingPass, PassStatus, PassType};
use crate::domain::ids::PassId;
use crate::domain::ports::{
    BoardingPassRepository, BoardingPassRepositoryError, RideRepository, RideRepositoryError,
};
use crate::domain::{Actor, Error};

fn map_pass_repository_error(error: BoardingPassRepositoryError) -> Error {
    match error {
        BoardingPassRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("boarding pass repository unavailable: {message}"))
        }
        BoardingPassRepositoryError::Query { message } => {
            Error::internal(format!("boarding pass repository error: {message}"))
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

fn pass_not_found(pass_id: PassId) -> Error {
    Error::not_found(format!("boarding pass {pass_id} not found"))
        .with_details(json!({ "code": "boarding_pass_not_found" }))
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Validates a rider's boarding pass ahead of ride creation.
#[derive(Clone)]
pub struct EntitlementChecker {
    passes: Arc<dyn BoardingPassRepository>,
    rides: Arc<dyn RideRepository>,
    clock: Arc<dyn Clock>,
}

impl EntitlementChecker {
    /// Create a checker with the pass and ride repositories.
    #[must_use]
    pub fn new(
        passes: Arc<dyn BoardingPassRepository>,
        rides: Arc<dyn RideRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            passes,
            rides,
            clock,
        }
    }

    /// Run the entitlement ladder for `rider` against `pass_id`.
    ///
    /// Activates the validity window on the pass's first ride ever; the
    /// activation is idempotent under concurrency because the repository
    /// update requires both bounds to still be null. Returns the pass as it
    /// stands after any activation.
    pub async fn check_and_activate(
        &self,
        rider: &Actor,
        pass_id: PassId,
    ) -> Result<BoardingPass, Error> {
        let pass = self
            .passes
            .find_by_id(pass_id)
            .await
            .map_err(map_pass_repository_error)?
            .ok_or_else(|| pass_not_found(pass_id))?;

        if pass.user_id != rider.user_id() {
            return Err(Error::forbidden(
                "boarding pass is not linked to this account",
            )
            .with_details(json!({ "code": "not_linked_to_account" })));
        }

        let now = self.clock.utc();
        let pass = self.activate_if_first_ride(pass, now).await?;

        self.check_window(&pass, now)?;
        self.check_quota(&pass, now).await?;

        Ok(pass)
    }

    /// Set `[now, now + validity_days]` on an active pass's first ride ever.
    async fn activate_if_first_ride(
        &self,
        pass: BoardingPass,
        now: DateTime<Utc>,
    ) -> Result<BoardingPass, Error> {
        if pass.status != PassStatus::Active || pass.window_activated() {
            return Ok(pass);
        }

        let prior_rides = self
            .rides
            .count_all_for_pass(pass.id)
            .await
            .map_err(map_ride_repository_error)?;
        if prior_rides > 0 {
            return Ok(pass);
        }

        let Some(validity_days) = pass.plan.validity_days else {
            return Err(Error::invalid_request(
                "boarding pass plan carries no validity period",
            )
            .with_details(json!({ "code": "validity_set_failed" })));
        };

        let outcome = self
            .passes
            .activate_validity_window(pass.id, now, now + Duration::days(validity_days))
            .await
            .map_err(map_pass_repository_error)?
            .ok_or_else(|| pass_not_found(pass.id))?;

        Ok(outcome.into_pass())
    }

    fn check_window(&self, pass: &BoardingPass, now: DateTime<Utc>) -> Result<(), Error> {
        let window = pass.valid_from.zip(pass.valid_to);
        let Some((valid_from, valid_to)) = window else {
            return Err(Error::entitlement_violation(
                "boarding pass validity window has not been activated",
            )
            .with_details(json!({ "code": "validity_not_started" })));
        };

        if now < valid_from {
            return Err(Error::entitlement_violation(
                "boarding pass validity has not started yet",
            )
            .with_details(json!({ "code": "validity_not_started" })));
        }
        if now >= valid_to {
            return Err(Error::entitlement_violation("boarding pass has expired")
                .with_details(json!({ "code": "expired" })));
        }
        if pass.status != PassStatus::Active {
            return Err(Error::entitlement_violation("boarding pass is not active")
                .with_details(json!({ "code": "not_active" })));
        }
        Ok(())
    }

    /// Quota only binds limited passes; unlimited and airport passes skip it.
    async fn check_quota(&self, pass: &BoardingPass, now: DateTime<Utc>) -> Result<(), Error> {
        if pass.pass_type != PassType::LimitedRides {
            return Ok(());
        }

        let quota = pass.total_trips.zip(pass.total_daily_trips);
        let Some((total_trips, total_daily_trips)) = quota else {
            return Err(Error::invalid_request(
                "limited pass is missing its trip quota configuration",
            )
            .with_details(json!({ "code": "invalid_quota_config" })));
        };

        let consumed = self
            .rides
            .count_quota_consuming(pass.id, None)
            .await
            .map_err(map_ride_repository_error)?;
        if consumed >= u64::from(total_trips) {
            return Err(Error::entitlement_violation(
                "boarding pass ride quota is exhausted",
            )
            .with_details(json!({ "code": "quota_exhausted" })));
        }

        let consumed_today = self
            .rides
            .count_quota_consuming(pass.id, Some(start_of_day(now)))
            .await
            .map_err(map_ride_repository_error)?;
        if consumed_today >= u64::from(total_daily_trips) {
            return Err(Error::entitlement_violation(
                "boarding pass daily ride quota is exhausted",
            )
            .with_details(json!({ "code": "daily_quota_exhausted" })));
        }

        Ok(())
    }
}
