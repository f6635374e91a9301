//! # groupsync-events
//!
//! Typed event layer for groupsync.
//!
//! Provides the type-safe publishing abstraction the sync engine uses to
//! announce completed runs and to receive attribute-change triggers from
//! the external identity system.
//!
//! ## Features
//!
//! - **Type Safety**: Compile-time topic/event type association via the
//!   [`Event`] trait
//! - **Envelopes**: Every published event is wrapped with an id, type name,
//!   and timestamp for routing and audit
//! - **Transport-agnostic**: [`EventBus`] is the seam; the concrete bus is
//!   owned by the embedding application
//!
//! ## Example
//!
//! ```rust,ignore
//! use groupsync_events::{EventEnvelope, events::GroupsSynced};
//!
//! let event = GroupsSynced { user_ids: vec![] };
//! let envelope = EventEnvelope::new(event);
//! bus.publish(envelope.topic(), serde_json::to_value(&envelope)?).await?;
//! ```

pub mod bus;
pub mod envelope;
pub mod error;
pub mod event;
pub mod events;

// Re-exports for convenience
pub use bus::EventBus;
pub use envelope::{EventEnvelope, RawEnvelope};
pub use error::EventError;
pub use event::Event;
