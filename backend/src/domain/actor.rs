//! Caller identity primitives.
//!
//! Every engine operation receives an [`Actor`] naming who is calling and in
//! which role. Role checks happen before any state is read so an unrecognised
//! or disallowed role fails closed without touching the store.

use serde::{Deserialize, Serialize};

use crate::domain::Error;
use crate::domain::ids::UserId;

/// Closed set of caller roles recognised by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A passenger requesting and riding trips.
    Rider,
    /// A vehicle operator servicing trips.
    Driver,
    /// Back-office sales staff.
    Sales,
    /// Platform administrator.
    Admin,
}

impl Role {
    /// Stable wire name for the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rider => "rider",
            Self::Driver => "driver",
            Self::Sales => "sales",
            Self::Admin => "admin",
        }
    }
}

/// The authenticated caller of an engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    user_id: UserId,
    role: Role,
}

impl Actor {
    /// Build an actor from a session-derived identity and role.
    #[must_use]
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// The caller's account id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The caller's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Fail with [`Error::unauthorized`] unless the caller holds `role`.
    pub fn require_role(&self, role: Role) -> Result<(), Error> {
        if self.role == role {
            Ok(())
        } else {
            Err(Error::unauthorized(format!(
                "operation requires the {} role, caller holds {}",
                role.as_str(),
                self.role.as_str(),
            )))
        }
    }

    /// Fail unless the caller holds one of `roles`.
    pub fn require_one_of(&self, roles: &[Role]) -> Result<(), Error> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(Error::unauthorized(format!(
                "operation is not open to the {} role",
                self.role.as_str(),
            )))
        }
    }
}

/// Account flags the engine reads before admitting a driver-side operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Account id.
    pub id: UserId,
    /// Whether the account is active.
    pub active: bool,
    /// Whether the account has been blocked by an operator.
    pub blocked: bool,
}

impl UserSummary {
    /// Whether the account may act as a driver right now.
    #[must_use]
    pub fn may_drive(&self) -> bool {
        self.active && !self.blocked
    }
}
