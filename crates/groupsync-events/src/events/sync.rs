//! Group synchronization lifecycle events.
//!
//! `MemberFlagsChanged` is consumed: the identity system publishes it when
//! an attribute flag changes on a user account, and the engine uses it to
//! trigger a scoped sync. `GroupsSynced` is produced once per completed
//! reconciliation run for unrelated listeners to react to.

use serde::{Deserialize, Serialize};

use groupsync_core::UserId;

use crate::event::Event;

/// Published by the external identity system when one of a user's
/// membership attribute flags changes value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberFlagsChanged {
    /// The user whose flags changed.
    pub user_id: UserId,
}

impl Event for MemberFlagsChanged {
    const TOPIC: &'static str = "groupsync.member.flags.changed";
    const EVENT_TYPE: &'static str = "groupsync.member.flags.changed";
}

/// Published when a reconciliation run completes.
///
/// `user_ids` lists the users that were processed. Full-population runs
/// publish an empty list rather than enumerating the whole directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsSynced {
    /// Users processed by the run; empty for full-population runs.
    #[serde(default)]
    pub user_ids: Vec<UserId>,
}

impl Event for GroupsSynced {
    const TOPIC: &'static str = "groupsync.groups.synced";
    const EVENT_TYPE: &'static str = "groupsync.groups.synced";
}
