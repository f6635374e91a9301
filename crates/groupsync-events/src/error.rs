//! Error types for the groupsync-events crate.

use thiserror::Error;

/// Errors that can occur during event operations.
#[derive(Debug, Error)]
pub enum EventError {
    /// Failed to publish event to topic.
    #[error("Failed to publish to topic {topic}: {cause}")]
    PublishFailed { topic: String, cause: String },

    /// Failed to serialize event.
    #[error("Failed to serialize event type {event_type}: {cause}")]
    SerializationFailed { event_type: String, cause: String },

    /// Failed to deserialize event.
    #[error("Failed to deserialize event type {event_type}: {cause}")]
    DeserializationFailed { event_type: String, cause: String },

    /// Invalid event envelope.
    #[error("Invalid event envelope: {reason}")]
    InvalidEnvelope { reason: String },
}

impl EventError {
    /// Returns true if this error is transient and the operation can be
    /// retried on a later run.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, EventError::PublishFailed { .. })
    }
}
