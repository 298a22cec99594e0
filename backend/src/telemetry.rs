//! Tracing subscriber bootstrap shared by binaries and integration tests.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialise the global tracing subscriber from `RUST_LOG`.
///
/// Safe to call more than once; repeat initialisation is reported at warn
/// level and otherwise ignored so test binaries can call it per-case.
pub fn init() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}
