use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single push event delivered to connected clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    /// Unique identifier for this event
    pub id: Uuid,
    /// When the event was emitted
    pub emitted_at: DateTime<Utc>,
    /// Event name (e.g. "application.status_changed", "message.received")
    pub event: String,
    /// Event payload data
    pub payload: serde_json::Value,
    /// Correlation ID for tracing (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl PushEvent {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            emitted_at: Utc::now(),
            event: event.into(),
            payload,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// Outcome of a single emit call
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    /// The event that was emitted
    pub event_id: Uuid,
    /// Number of sockets the event was queued to
    pub delivered: usize,
    /// Number of sockets whose send channel was closed or full
    pub failed: usize,
}

impl DeliveryResult {
    pub fn new(event_id: Uuid, delivered: usize, failed: usize) -> Self {
        Self {
            event_id,
            delivered,
            failed,
        }
    }
}
