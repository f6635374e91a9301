//! External collaborator contracts.
//!
//! The engine owns no storage and no scheduling infrastructure; it consumes
//! the user directory, the group membership store, the feature gate, and the
//! job scheduler through these traits. All of them are object-safe so the
//! wiring layer can hold `Arc<dyn ...>` handles.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use groupsync_core::{UserId, UserRecord};
use groupsync_events::RawEnvelope;

use crate::error::SyncResult;

/// Read access to user accounts in the external identity system.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// List every user account.
    async fn list_all(&self) -> SyncResult<Vec<UserRecord>>;

    /// List the accounts with the given ids.
    ///
    /// Unknown ids are silently omitted from the result; a lookup miss is
    /// not an error.
    async fn list_by_ids(&self, ids: &[UserId]) -> SyncResult<Vec<UserRecord>>;

    /// List accounts whose external record was updated strictly after
    /// `since`.
    async fn list_updated_since(&self, since: DateTime<Utc>) -> SyncResult<Vec<UserRecord>>;
}

/// Lookup of group handles by name.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Find a group by its name. `None` means the group does not exist,
    /// which is a configuration gap, not an error.
    async fn find_by_name(&self, name: &str) -> SyncResult<Option<Arc<dyn GroupHandle>>>;
}

/// Handle to one externally owned group membership set.
///
/// Single add/remove calls are atomic on the store side; there is no
/// cross-call transaction.
#[async_trait]
pub trait GroupHandle: Send + Sync {
    /// The group's name.
    fn name(&self) -> &str;

    /// Whether the user currently belongs to the group.
    async fn has_member(&self, user_id: UserId) -> SyncResult<bool>;

    /// Add the user to the group. Adding an existing member is a no-op.
    async fn add_member(&self, user_id: UserId) -> SyncResult<()>;

    /// Remove the user from the group. Removing a non-member is a no-op.
    async fn remove_member(&self, user_id: UserId) -> SyncResult<()>;
}

/// Feature gate consulted once at the start of every triggered run.
pub trait FeatureFlag: Send + Sync {
    /// Whether group synchronization is currently enabled.
    fn is_enabled(&self) -> bool;
}

/// A unit of work the external job infrastructure can execute.
///
/// A failed execution is surfaced to the scheduler as a failed job; the
/// engine does not retry inline.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Stable job name for scheduler dashboards and logs.
    fn name(&self) -> &'static str;

    /// Run the job to completion.
    async fn execute(&self) -> SyncResult<()>;
}

/// Handler for bus events the engine subscribes to.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process one received envelope.
    async fn handle(&self, envelope: RawEnvelope) -> SyncResult<()>;
}

/// Registration surface of the external job infrastructure.
///
/// The engine registers its jobs and subscriptions declaratively at
/// startup; the infrastructure owns execution, concurrency, and failure
/// reporting.
pub trait JobScheduler: Send + Sync {
    /// Run `job` repeatedly, every `interval`.
    fn schedule_periodic(&self, interval: Duration, job: Arc<dyn ScheduledJob>);

    /// Run `job` once, after `delay`.
    fn schedule_after_delay(&self, delay: Duration, job: Arc<dyn ScheduledJob>);

    /// Deliver events published on `topic` to `handler`.
    fn subscribe(&self, topic: &str, handler: Arc<dyn EventHandler>);
}
