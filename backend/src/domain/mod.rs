//! Domain model and services for the ride dispatch engine.
//!
//! Entities and state machines live beside the stateless services that
//! drive them; persistence and notification cross the [`ports`] boundary.

pub mod acceptance;
pub mod actor;
pub mod boarding_pass;
pub mod dispatch;
pub mod entitlement;
pub mod error;
pub mod events;
pub mod geo;
pub mod ids;
pub mod lifecycle;
pub mod ports;
pub mod ride;
pub mod ride_request;
pub mod vehicle;
pub mod vehicle_selection;

pub use actor::{Actor, Role, UserSummary};
pub use error::{Error, ErrorCode};
