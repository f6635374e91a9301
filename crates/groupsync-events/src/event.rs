//! Event trait definition for type-safe event publishing.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be published and consumed as bus events.
///
/// Implementors define the topic the event is routed on and the event type
/// name stored in the envelope. Payloads are serialized as JSON.
///
/// # Example
///
/// ```rust
/// use serde::{Serialize, Deserialize};
/// use groupsync_events::Event;
/// use groupsync_core::UserId;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// pub struct MemberSuspended {
///     pub user_id: UserId,
/// }
///
/// impl Event for MemberSuspended {
///     const TOPIC: &'static str = "groupsync.member.suspended";
///     const EVENT_TYPE: &'static str = "groupsync.member.suspended";
/// }
/// ```
pub trait Event: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The bus topic for this event type.
    const TOPIC: &'static str;

    /// The fully qualified event type name.
    ///
    /// Stored in the event envelope for routing and deserialization.
    /// Convention: `groupsync.<entity>.<action>`
    const EVENT_TYPE: &'static str;
}
