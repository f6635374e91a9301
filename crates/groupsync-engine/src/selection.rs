//! User batch selection.
//!
//! Each trigger source chooses one selection mode: event-triggered syncs
//! pass the explicit ids they saw change, the periodic catch-up job uses a
//! recently-changed window, and the daily backstop sweeps the full
//! population.

use chrono::{DateTime, Duration, Utc};

use groupsync_core::{UserId, UserRecord};

use crate::error::SyncResult;
use crate::traits::UserDirectory;

/// Which users a reconciliation run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A fixed set of user ids. Users outside the set are left untouched
    /// regardless of their flag state.
    Explicit(Vec<UserId>),

    /// Users whose external record was updated strictly after
    /// `now - window`.
    RecentlyChanged {
        /// Look-back window; must exceed the scheduling period so timer
        /// jitter cannot open a gap between consecutive runs.
        window: Duration,
    },

    /// Every user in the directory.
    FullPopulation,
}

impl Selection {
    /// Resolve the selection to a user batch.
    pub async fn select(
        &self,
        users: &dyn UserDirectory,
        now: DateTime<Utc>,
    ) -> SyncResult<Vec<UserRecord>> {
        match self {
            Selection::Explicit(ids) => {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                users.list_by_ids(ids).await
            }
            Selection::RecentlyChanged { window } => {
                users.list_updated_since(now - *window).await
            }
            Selection::FullPopulation => users.list_all().await,
        }
    }

    /// Whether the completion notification should enumerate the processed
    /// users. Full-population runs publish an empty list instead.
    #[must_use]
    pub fn enumerates_users(&self) -> bool {
        !matches!(self, Selection::FullPopulation)
    }

    /// Short mode name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Selection::Explicit(_) => "explicit",
            Selection::RecentlyChanged { .. } => "recently_changed",
            Selection::FullPopulation => "full",
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}
