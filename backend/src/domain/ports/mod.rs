//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod boarding_pass_repository;
mod confirmation_counter;
mod event_sink;
mod ride_repository;
mod ride_request_repository;
mod user_repository;
mod vehicle_repository;

#[cfg(test)]
pub use boarding_pass_repository::MockBoardingPassRepository;
pub use boarding_pass_repository::{
    ActivationOutcome, BoardingPassRepository, BoardingPassRepositoryError,
    FixtureBoardingPassRepository,
};
#[cfg(test)]
pub use confirmation_counter::MockConfirmationCodeCounter;
pub use confirmation_counter::{
    ConfirmationCodeCounter, ConfirmationCounterError, FixtureConfirmationCodeCounter,
};
#[cfg(test)]
pub use event_sink::MockEventSink;
pub use event_sink::{EventSink, EventSinkError, NoopEventSink};
#[cfg(test)]
pub use ride_repository::MockRideRepository;
pub use ride_repository::{
    AssignDriverOutcome, DriverAssignment, RideRepository, RideRepositoryError, RideTransition,
    TransitionOutcome,
};
#[cfg(test)]
pub use ride_request_repository::MockRideRequestRepository;
pub use ride_request_repository::{
    FixtureRideRequestRepository, RideRequestRepository, RideRequestRepositoryError,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{FixtureUserRepository, UserRepository, UserRepositoryError};
#[cfg(test)]
pub use vehicle_repository::MockVehicleRepository;
pub use vehicle_repository::{FixtureVehicleRepository, VehicleRepository, VehicleRepositoryError};
