//! Adapter implementations of the domain's outbound ports.

pub mod events;
pub mod memory;
