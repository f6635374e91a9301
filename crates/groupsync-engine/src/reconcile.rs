//! Membership reconciliation.
//!
//! Compares desired membership (rule evaluation) against actual membership
//! (the external group store) and applies only the differing add/remove
//! operations. Runs are idempotent and not transactional: a failed run
//! leaves already-applied operations in place and the next scheduled run
//! converges from wherever the last one stopped.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use groupsync_core::{RunId, UserRecord};
use groupsync_events::events::GroupsSynced;

use crate::error::SyncResult;
use crate::notify::Notifier;
use crate::rules::{GroupRule, RuleSet};
use crate::stats::RunStatistics;
use crate::traits::{GroupDirectory, GroupHandle};

/// Applies the minimal membership diff for a batch of users.
pub struct Reconciler {
    groups: Arc<dyn GroupDirectory>,
    notifier: Notifier,
}

impl Reconciler {
    /// Create a reconciler over the given group directory and notifier.
    #[must_use]
    pub fn new(groups: Arc<dyn GroupDirectory>, notifier: Notifier) -> Self {
        Self { groups, notifier }
    }

    /// Reconcile every rule for every user in the batch.
    ///
    /// Rules whose target group does not exist are inert for the whole run:
    /// skipped per rule, never an error. A store failure aborts the run and
    /// propagates; operations applied before the failure stay applied.
    ///
    /// On success a single `GroupsSynced` notification is published,
    /// best-effort, listing the processed users when `enumerate_users` is
    /// set and an empty list otherwise.
    #[instrument(skip_all, fields(run_id = %run_id, users = users.len(), rules = rules.len()))]
    pub async fn reconcile(
        &self,
        run_id: RunId,
        users: &[UserRecord],
        rules: &RuleSet,
        enumerate_users: bool,
    ) -> SyncResult<RunStatistics> {
        let mut stats = RunStatistics::new();

        let handles = self.resolve_groups(rules, &mut stats).await?;

        for user in users {
            for (rule, handle) in &handles {
                self.reconcile_pair(user, rule, handle.as_ref(), &mut stats)
                    .await?;
            }
            stats.users_processed += 1;
        }

        info!(
            users_processed = stats.users_processed,
            members_added = stats.members_added,
            members_removed = stats.members_removed,
            rules_skipped = stats.rules_skipped,
            "Reconciliation run complete"
        );

        let user_ids = if enumerate_users {
            users.iter().map(|u| u.id).collect()
        } else {
            Vec::new()
        };
        self.notifier.publish(GroupsSynced { user_ids }).await;

        Ok(stats)
    }

    /// Resolve each rule's target group once for the whole run.
    async fn resolve_groups<'a>(
        &self,
        rules: &'a RuleSet,
        stats: &mut RunStatistics,
    ) -> SyncResult<Vec<(&'a GroupRule, Arc<dyn GroupHandle>)>> {
        let mut handles = Vec::with_capacity(rules.len());
        for rule in rules.iter() {
            match self.groups.find_by_name(&rule.name).await? {
                Some(handle) => handles.push((rule, handle)),
                None => {
                    debug!(group = %rule.name, "Target group does not exist, rule inert for this run");
                    stats.rules_skipped += 1;
                }
            }
        }
        Ok(handles)
    }

    /// Converge one user/rule pair.
    async fn reconcile_pair(
        &self,
        user: &UserRecord,
        rule: &GroupRule,
        handle: &dyn GroupHandle,
        stats: &mut RunStatistics,
    ) -> SyncResult<()> {
        let desired = rule.matches(user);
        let current = handle.has_member(user.id).await?;

        if desired && !current {
            handle.add_member(user.id).await?;
            stats.members_added += 1;
            debug!(user_id = %user.id, group = %rule.name, "Added member");
        } else if !desired && current {
            handle.remove_member(user.id).await?;
            stats.members_removed += 1;
            debug!(user_id = %user.id, group = %rule.name, "Removed member");
        } else {
            stats.memberships_verified += 1;
        }

        Ok(())
    }
}
