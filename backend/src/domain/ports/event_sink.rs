//! Port receiving lifecycle facts after the authoritative write commits.

use async_trait::async_trait;

use crate::domain::events::RideEvent;

use super::define_port_error;

define_port_error! {
    /// Errors raised by event sink adapters.
    pub enum EventSinkError {
        /// The fact could not be handed to the sink.
        Publish => "event sink publish failed: {message}",
    }
}

/// Port for publishing lifecycle facts.
///
/// Sinks run strictly after the state they describe has committed; a sink
/// failure is the caller's to log and must never fail or roll back the
/// operation that produced the fact.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Hand one fact to the sink.
    async fn publish(&self, event: RideEvent) -> Result<(), EventSinkError>;
}

/// Fixture sink that discards every fact.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(&self, _event: RideEvent) -> Result<(), EventSinkError> {
        Ok(())
    }
}
