//! Publisher seam between the sync engine and the event transport.

use async_trait::async_trait;

use crate::error::EventError;

/// Fire-and-forget event publisher.
///
/// The transport (broker client, in-process dispatcher, test double) is
/// owned by the embedding application. No delivery guarantee, no retry,
/// no acknowledgment: the absence of listeners never affects the caller.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a serialized envelope to a topic.
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), EventError>;
}
