//! Event sink adapters.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use crate::domain::events::RideEvent;
use crate::domain::ports::{EventSink, EventSinkError};

/// Sink that logs each fact as a structured tracing event.
///
/// Stands in for the notification dispatcher boundary: downstream fan-out
/// to email, SMS, or push happens outside the engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn publish(&self, event: RideEvent) -> Result<(), EventSinkError> {
        match serde_json::to_string(&event) {
            Ok(payload) => {
                info!(event = event.name(), %payload, "ride lifecycle event");
                Ok(())
            }
            Err(error) => Err(EventSinkError::publish(format!(
                "failed to serialise {} event: {error}",
                event.name()
            ))),
        }
    }
}

/// Sink that records published facts for later inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<RideEvent>>,
}

impl RecordingEventSink {
    /// Snapshot of everything published so far, in order.
    #[must_use]
    pub fn recorded(&self) -> Vec<RideEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, event: RideEvent) -> Result<(), EventSinkError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }
}
