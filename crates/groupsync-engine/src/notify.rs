//! Best-effort completion notifications.

use std::sync::Arc;

use tracing::warn;

use groupsync_events::{Event, EventBus, EventEnvelope};

/// Publishes engine events to the bus, fire-and-forget.
///
/// Publish failures are logged and swallowed: listeners are optional and a
/// missing or unreachable bus never affects reconciliation correctness.
#[derive(Clone)]
pub struct Notifier {
    bus: Arc<dyn EventBus>,
}

impl Notifier {
    /// Create a notifier over the given bus.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    /// Wrap the payload in an envelope and publish it.
    pub async fn publish<E: Event>(&self, payload: E) {
        let envelope = EventEnvelope::new(payload);
        let value = match serde_json::to_value(&envelope) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    event_type = E::EVENT_TYPE,
                    error = %e,
                    "Failed to serialize event, dropping notification"
                );
                return;
            }
        };

        if let Err(e) = self.bus.publish(E::TOPIC, value).await {
            warn!(
                topic = E::TOPIC,
                error = %e,
                "Failed to publish event, dropping notification"
            );
        }
    }
}
