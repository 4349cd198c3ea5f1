//! Broadcast hub for monitor events.
//!
//! The scheduler and the monitor service publish; every open `/events`
//! stream holds its own receiver. Nothing is persisted: an event published
//! while no stream is open is gone.

use aura_core::types::{MachineId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events buffered per receiver before the slowest one starts lagging.
const DEFAULT_CAPACITY: usize = 256;

/// Envelope for everything sent over the bus and out to SSE clients.
///
/// `event_type` doubles as the SSE event name, so it is one of the
/// constants in [`crate::event_types`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEvent {
    pub event_type: String,
    /// `None` for fleet-wide events such as cycle summaries.
    pub machine_id: Option<MachineId>,
    pub payload: serde_json::Value,
    pub timestamp: Timestamp,
}

impl MonitorEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            machine_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn for_machine(mut self, machine_id: impl Into<MachineId>) -> Self {
        self.machine_id = Some(machine_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Whether a stream watching `machine_id` should see this event.
    /// Fleet-wide events concern every machine.
    pub fn concerns(&self, machine_id: &str) -> bool {
        self.machine_id.as_deref().map_or(true, |id| id == machine_id)
    }
}

/// Fan-out of [`MonitorEvent`]s to any number of receivers, shared as
/// `Arc<EventBus>`.
///
/// A receiver that falls more than the channel capacity behind gets
/// `RecvError::Lagged` and resumes at the oldest buffered event.
pub struct EventBus {
    sender: broadcast::Sender<MonitorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns how many receivers got the event.
    pub fn publish(&self, event: MonitorEvent) -> usize {
        let event_type = event.event_type.clone();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(%event_type, delivered, "Monitor event published");
        delivered
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
