//! Ride records and the ride status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::geo::GeoPoint;
use crate::domain::ids::{PassId, RideId, UserId, VehicleId};

/// Lifecycle status of a ride.
///
/// The only reachable transitions are
/// `New → Assigned → InProgress → Complete` and
/// `{New, Assigned, InProgress} → Canceled`. [`RideStatus::Complete`] and
/// [`RideStatus::Canceled`] are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    /// Created and broadcast to candidate drivers; no driver assigned yet.
    New,
    /// A driver accepted; awaiting pickup.
    Assigned,
    /// The rider is on board.
    InProgress,
    /// The trip finished normally.
    Complete,
    /// The trip was cancelled by the rider or the assigned driver.
    Canceled,
}

impl RideStatus {
    /// Whether no further transition may leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Canceled)
    }

    /// Whether `next` is a legal successor of this status.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::Assigned)
                | (Self::Assigned, Self::InProgress)
                | (Self::InProgress, Self::Complete)
                | (Self::New | Self::Assigned | Self::InProgress, Self::Canceled)
        )
    }

    /// Whether rides in this status consume quota on a limited pass.
    ///
    /// Everything but cancelled rides counts: open rides hold a slot and
    /// completed rides have spent one.
    #[must_use]
    pub const fn counts_against_quota(self) -> bool {
        !matches!(self, Self::Canceled)
    }

    /// Stable wire name for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
            Self::Canceled => "canceled",
        }
    }
}

/// Address plus coordinates for one ride endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideLocation {
    /// Human-readable address.
    pub address: String,
    /// Geographic coordinates.
    pub point: GeoPoint,
}

/// One requested trip.
///
/// Created by the dispatch broadcast in status [`RideStatus::New`]; mutated
/// only through conditional repository updates; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    /// Ride id.
    pub id: RideId,
    /// Boarding pass the ride is consumed from.
    pub boarding_pass_id: PassId,
    /// Requesting rider.
    pub rider_id: UserId,
    /// Assigned driver; null until acceptance.
    pub driver_id: Option<UserId>,
    /// Assigned vehicle; null until acceptance.
    pub vehicle_id: Option<VehicleId>,
    /// Human-readable code the driver must present back at pickup.
    pub confirmation_code: String,
    /// Pickup endpoint.
    pub pickup: RideLocation,
    /// Drop-off endpoint.
    pub dropoff: RideLocation,
    /// Route distance in kilometres, as quoted at creation.
    pub distance_km: f64,
    /// Lifecycle status.
    pub status: RideStatus,
    /// When the ride was requested.
    pub requested_at: DateTime<Utc>,
    /// When the assigned vehicle reported arrival at pickup.
    pub vehicle_arrived_at: Option<DateTime<Utc>>,
    /// When the trip started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the trip ended.
    pub ended_at: Option<DateTime<Utc>>,
    /// Trip duration in whole minutes, recorded at completion.
    pub duration_minutes: Option<i64>,
    /// Optional reference to an uploaded route map document.
    pub route_map_file_id: Option<String>,
    /// Who cancelled the ride, when cancelled.
    pub cancelled_by: Option<UserId>,
    /// Why the ride was cancelled.
    pub cancellation_reason: Option<String>,
    /// When the ride was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::RideStatus::{self, Assigned, Canceled, Complete, InProgress, New};

    const ALL: [RideStatus; 5] = [New, Assigned, InProgress, Complete, Canceled];

    #[rstest]
    #[case(New, Assigned)]
    #[case(Assigned, InProgress)]
    #[case(InProgress, Complete)]
    #[case(New, Canceled)]
    #[case(Assigned, Canceled)]
    #[case(InProgress, Canceled)]
    fn legal_transitions(#[case] from: RideStatus, #[case] to: RideStatus) {
        assert!(from.can_transition_to(to));
    }

    #[test]
    fn only_six_transitions_are_reachable() {
        let legal = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .count();
        assert_eq!(legal, 6);
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for next in ALL {
            assert!(!Complete.can_transition_to(next));
            assert!(!Canceled.can_transition_to(next));
        }
    }

    #[test]
    fn cancelled_rides_do_not_consume_quota() {
        assert!(!Canceled.counts_against_quota());
        for status in [New, Assigned, InProgress, Complete] {
            assert!(status.counts_against_quota());
        }
    }
}
