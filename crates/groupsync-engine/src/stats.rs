//! Run statistics.

use serde::{Deserialize, Serialize};

/// Counters for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Users evaluated during the run.
    #[serde(default)]
    pub users_processed: u32,
    /// Memberships created.
    #[serde(default)]
    pub members_added: u32,
    /// Memberships revoked.
    #[serde(default)]
    pub members_removed: u32,
    /// User/rule pairs already in the desired state.
    #[serde(default)]
    pub memberships_verified: u32,
    /// Rules skipped because their target group does not exist.
    #[serde(default)]
    pub rules_skipped: u32,
}

impl RunStatistics {
    /// Create new empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total membership mutations applied by the run.
    #[must_use]
    pub fn operations(&self) -> u32 {
        self.members_added + self.members_removed
    }

    /// Whether the run changed any membership.
    #[must_use]
    pub fn changed_anything(&self) -> bool {
        self.operations() > 0
    }
}
