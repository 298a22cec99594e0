//! Ride dispatch backend library modules.
//!
//! The crate is organised hexagonally: `domain` holds entities, dispatch and
//! lifecycle services, and the ports they drive; `outbound` holds adapters
//! satisfying those ports. Callers construct services with explicit
//! [`config`] values and injected adapters; there are no process-wide
//! singletons.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;
