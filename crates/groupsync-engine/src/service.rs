//! Run orchestration.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use groupsync_core::{RunId, UserId};
use groupsync_events::EventBus;

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::notify::Notifier;
use crate::reconcile::Reconciler;
use crate::rules::RuleSet;
use crate::selection::Selection;
use crate::traits::{FeatureFlag, GroupDirectory, UserDirectory};

/// One-stop entry point for triggered reconciliation runs.
///
/// Every trigger source calls [`SyncService::run`] with its selection; the
/// service applies the feature gate, resolves the user batch, builds the
/// rule table fresh, and hands off to the reconciler.
pub struct SyncService {
    users: Arc<dyn UserDirectory>,
    feature: Arc<dyn FeatureFlag>,
    reconciler: Reconciler,
    config: SyncConfig,
}

impl SyncService {
    /// Wire up a service. Fails if the configuration is invalid.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        groups: Arc<dyn GroupDirectory>,
        bus: Arc<dyn EventBus>,
        feature: Arc<dyn FeatureFlag>,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            users,
            feature,
            reconciler: Reconciler::new(groups, Notifier::new(bus)),
            config,
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Execute one reconciliation run over the given selection.
    ///
    /// Returns the ids of the users that were processed. When the feature
    /// gate is disabled the run is a complete no-op: no selection, no
    /// evaluation, no notification, and an empty id list.
    #[instrument(skip(self), fields(mode = selection.kind()))]
    pub async fn run(&self, selection: Selection) -> SyncResult<Vec<UserId>> {
        if !self.feature.is_enabled() {
            debug!("Group sync is disabled, skipping run");
            return Ok(Vec::new());
        }

        let run_id = RunId::new();
        info!(run_id = %run_id, "Starting reconciliation run");

        let users = selection.select(self.users.as_ref(), Utc::now()).await?;
        let rules = RuleSet::builtin();

        self.reconciler
            .reconcile(run_id, &users, &rules, selection.enumerates_users())
            .await?;

        Ok(users.into_iter().map(|u| u.id).collect())
    }
}
