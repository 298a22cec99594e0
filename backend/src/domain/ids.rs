//! Typed identifiers for dispatch entities.
//!
//! Each entity gets its own UUID newtype so a ride id can never be passed
//! where a ride-request id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_entity_id {
    (
        $(#[$outer:meta])*
        pub struct $name:ident
    ) => {
        $(#[$outer])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_entity_id! {
    /// Stable identifier of a rider or driver account.
    pub struct UserId
}

define_entity_id! {
    /// Stable identifier of a boarding pass.
    pub struct PassId
}

define_entity_id! {
    /// Stable identifier of a ride.
    pub struct RideId
}

define_entity_id! {
    /// Stable identifier of one broadcast ride request.
    pub struct RideRequestId
}

define_entity_id! {
    /// Stable identifier of a vehicle.
    pub struct VehicleId
}
