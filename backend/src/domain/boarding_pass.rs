//! Boarding pass entitlement records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{PassId, UserId};

/// Entitlement flavour of a boarding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassType {
    /// Quota-limited pass; ride counts are enforced against `total_trips`.
    LimitedRides,
    /// Unlimited rides inside the validity window.
    UnlimitedRides,
    /// Airport shuttle service pass; no quota enforcement.
    AirportService,
}

/// Administrative status of a boarding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    /// Pass may be used, subject to its validity window and quota.
    Active,
    /// Pass has been expired by an operator or billing flow.
    Expired,
}

/// Purchased plan parameters attached to a pass.
///
/// `validity_days` drives the one-time window activation; a pass sold without
/// it cannot be activated and fails ride creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassPlan {
    /// Number of days the validity window spans once activated.
    pub validity_days: Option<i64>,
}

/// A prepaid ride entitlement owned by exactly one rider.
///
/// ## Invariants
/// - `valid_from`/`valid_to` are set exactly once, at the pass's first ride
///   creation, as `[now, now + plan.validity_days]`. Activation is guarded by
///   a conditional repository update requiring both bounds to still be null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardingPass {
    /// Pass id.
    pub id: PassId,
    /// Owning rider.
    pub user_id: UserId,
    /// Entitlement flavour.
    pub pass_type: PassType,
    /// Administrative status.
    pub status: PassStatus,
    /// Validity window start; null until first use.
    pub valid_from: Option<DateTime<Utc>>,
    /// Validity window end; null until first use.
    pub valid_to: Option<DateTime<Utc>>,
    /// Lifetime ride quota; only enforced for [`PassType::LimitedRides`].
    pub total_trips: Option<u32>,
    /// Per-day ride quota; only enforced for [`PassType::LimitedRides`].
    pub total_daily_trips: Option<u32>,
    /// Purchased plan parameters.
    pub plan: PassPlan,
}

impl BoardingPass {
    /// Whether the validity window has been activated.
    #[must_use]
    pub fn window_activated(&self) -> bool {
        self.valid_from.is_some() && self.valid_to.is_some()
    }
}
