//! Reconciliation Engine Tests
//!
//! End-to-end tests for the sync engine covering:
//! - Convergence of actual membership to rule evaluation
//! - Idempotence of repeated runs
//! - Composite rule derivation
//! - Missing-group tolerance
//! - Scoped (explicit) selection
//! - Feature gate behavior
//! - Store failure propagation without rollback
//! - Completion notifications
//! - Debounced event triggers and job registration

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use groupsync_core::{FlagValue, RunId, UserId, UserRecord};
use groupsync_events::events::{GroupsSynced, MemberFlagsChanged};
use groupsync_events::{Event, EventBus, EventEnvelope, EventError, RawEnvelope};
use groupsync_engine::{
    register_jobs, Debouncer, EventHandler, FeatureFlag, FlagsChangedHandler, GroupDirectory,
    GroupHandle, GroupRule, JobScheduler, Notifier, Reconciler, RuleSet, ScheduledJob, Selection,
    SyncConfig, SyncError, SyncResult, SyncService, UserDirectory,
};

// =============================================================================
// Mock Collaborators
// =============================================================================

/// In-memory user directory with call counters.
#[derive(Default)]
struct InMemoryDirectory {
    users: Vec<UserRecord>,
    list_all_calls: AtomicUsize,
    list_by_ids_calls: AtomicUsize,
}

impl InMemoryDirectory {
    fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn list_all(&self) -> SyncResult<Vec<UserRecord>> {
        self.list_all_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.clone())
    }

    async fn list_by_ids(&self, ids: &[UserId]) -> SyncResult<Vec<UserRecord>> {
        self.list_by_ids_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_updated_since(&self, since: DateTime<Utc>) -> SyncResult<Vec<UserRecord>> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.updated_at > since)
            .cloned()
            .collect())
    }
}

/// Shared state behind the in-memory group store.
#[derive(Default)]
struct GroupStoreInner {
    groups: Mutex<HashMap<String, HashSet<UserId>>>,
    add_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    /// Group name whose add_member calls fail.
    fail_add_for: Mutex<Option<String>>,
}

/// In-memory group membership store.
#[derive(Clone, Default)]
struct InMemoryGroups {
    inner: Arc<GroupStoreInner>,
}

impl InMemoryGroups {
    fn with_groups(names: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut groups = store.inner.groups.lock().unwrap();
            for name in names {
                groups.insert((*name).to_string(), HashSet::new());
            }
        }
        store
    }

    fn seed_member(&self, group: &str, user_id: UserId) {
        self.inner
            .groups
            .lock()
            .unwrap()
            .get_mut(group)
            .expect("group must exist")
            .insert(user_id);
    }

    fn members(&self, group: &str) -> HashSet<UserId> {
        self.inner
            .groups
            .lock()
            .unwrap()
            .get(group)
            .cloned()
            .unwrap_or_default()
    }

    fn fail_add_for(&self, group: &str) {
        *self.inner.fail_add_for.lock().unwrap() = Some(group.to_string());
    }

    fn mutation_count(&self) -> usize {
        self.inner.add_calls.load(Ordering::SeqCst) + self.inner.remove_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroupDirectory for InMemoryGroups {
    async fn find_by_name(&self, name: &str) -> SyncResult<Option<Arc<dyn GroupHandle>>> {
        if self.inner.groups.lock().unwrap().contains_key(name) {
            Ok(Some(Arc::new(InMemoryGroupHandle {
                name: name.to_string(),
                inner: self.inner.clone(),
            })))
        } else {
            Ok(None)
        }
    }
}

struct InMemoryGroupHandle {
    name: String,
    inner: Arc<GroupStoreInner>,
}

#[async_trait]
impl GroupHandle for InMemoryGroupHandle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn has_member(&self, user_id: UserId) -> SyncResult<bool> {
        Ok(self
            .inner
            .groups
            .lock()
            .unwrap()
            .get(&self.name)
            .is_some_and(|members| members.contains(&user_id)))
    }

    async fn add_member(&self, user_id: UserId) -> SyncResult<()> {
        if self.inner.fail_add_for.lock().unwrap().as_deref() == Some(self.name.as_str()) {
            return Err(SyncError::membership_store(&self.name, "store unreachable"));
        }
        self.inner.add_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .groups
            .lock()
            .unwrap()
            .get_mut(&self.name)
            .expect("group must exist")
            .insert(user_id);
        Ok(())
    }

    async fn remove_member(&self, user_id: UserId) -> SyncResult<()> {
        self.inner.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .groups
            .lock()
            .unwrap()
            .get_mut(&self.name)
            .expect("group must exist")
            .remove(&user_id);
        Ok(())
    }
}

/// Bus that records every published envelope.
#[derive(Default)]
struct RecordingBus {
    published: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingBus {
    fn published_on(&self, topic: &str) -> Vec<serde_json::Value> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

#[async_trait]
impl EventBus for RecordingBus {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), EventError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}

struct StaticFlag(bool);

impl FeatureFlag for StaticFlag {
    fn is_enabled(&self) -> bool {
        self.0
    }
}

/// Scheduler that records registrations instead of executing them.
#[derive(Default)]
struct RecordingScheduler {
    periodic: Mutex<Vec<(Duration, Arc<dyn ScheduledJob>)>>,
    delayed: Mutex<Vec<(Duration, Arc<dyn ScheduledJob>)>>,
    subscriptions: Mutex<Vec<(String, Arc<dyn EventHandler>)>>,
}

impl JobScheduler for RecordingScheduler {
    fn schedule_periodic(&self, interval: Duration, job: Arc<dyn ScheduledJob>) {
        self.periodic.lock().unwrap().push((interval, job));
    }

    fn schedule_after_delay(&self, delay: Duration, job: Arc<dyn ScheduledJob>) {
        self.delayed.lock().unwrap().push((delay, job));
    }

    fn subscribe(&self, topic: &str, handler: Arc<dyn EventHandler>) {
        self.subscriptions
            .lock()
            .unwrap()
            .push((topic.to_string(), handler));
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn user_with(flags: &[(&str, FlagValue)]) -> UserRecord {
    let mut user = UserRecord::new(UserId::new(), Utc::now());
    for (name, value) in flags {
        user = user.with_flag(name, *value);
    }
    user
}

fn make_service(
    users: Vec<UserRecord>,
    groups: &InMemoryGroups,
    bus: &Arc<RecordingBus>,
    enabled: bool,
) -> (Arc<SyncService>, Arc<InMemoryDirectory>) {
    let directory = Arc::new(InMemoryDirectory::with_users(users));
    let service = SyncService::new(
        directory.clone(),
        Arc::new(groups.clone()),
        bus.clone(),
        Arc::new(StaticFlag(enabled)),
        SyncConfig::default(),
    )
    .expect("default config is valid");
    (Arc::new(service), directory)
}

fn raw_flags_changed(user_id: UserId) -> RawEnvelope {
    let envelope = EventEnvelope::new(MemberFlagsChanged { user_id });
    RawEnvelope::from_bytes(&envelope.to_json_bytes().unwrap()).unwrap()
}

// =============================================================================
// Convergence and Idempotence
// =============================================================================

#[tokio::test]
async fn test_full_run_converges_membership() {
    let exec_member = user_with(&[("status_code[1003]", FlagValue::True)]);
    let crew_only = user_with(&[("status_code[3001]", FlagValue::True)]);
    let outsider = user_with(&[]);

    let groups = InMemoryGroups::with_groups(&["exec", "crew"]);
    // Stale membership that evaluation no longer supports.
    groups.seed_member("exec", outsider.id);

    let bus = Arc::new(RecordingBus::default());
    let (service, _) = make_service(
        vec![exec_member.clone(), crew_only.clone(), outsider.clone()],
        &groups,
        &bus,
        true,
    );

    let processed = service.run(Selection::FullPopulation).await.unwrap();
    assert_eq!(processed.len(), 3);

    assert_eq!(
        groups.members("exec"),
        HashSet::from([exec_member.id]),
        "exec holds exactly the flagged user, stale member removed"
    );
    assert_eq!(
        groups.members("crew"),
        HashSet::from([exec_member.id, crew_only.id]),
        "crew holds the exec member (derived flag) and the extra-flag user"
    );
}

#[tokio::test]
async fn test_second_run_performs_no_operations() {
    let member = user_with(&[("status_code[1003]", FlagValue::True)]);
    let groups = InMemoryGroups::with_groups(&["exec", "crew"]);
    let bus = Arc::new(RecordingBus::default());
    let (service, _) = make_service(vec![member], &groups, &bus, true);

    service.run(Selection::FullPopulation).await.unwrap();
    let mutations_after_first = groups.mutation_count();
    assert!(mutations_after_first > 0);

    service.run(Selection::FullPopulation).await.unwrap();
    assert_eq!(
        groups.mutation_count(),
        mutations_after_first,
        "second run with unchanged flags must apply zero operations"
    );
}

// =============================================================================
// Composite Rule
// =============================================================================

#[tokio::test]
async fn test_composite_rule_membership() {
    let rules = RuleSet::with_rules(vec![GroupRule::new("exec", ["A"])], ["B"]);

    let a_user = user_with(&[("A", FlagValue::True)]);
    let b_user = user_with(&[("B", FlagValue::True)]);
    let neither = user_with(&[]);

    let groups = InMemoryGroups::with_groups(&["exec", "crew"]);
    let bus = Arc::new(RecordingBus::default());
    let reconciler = Reconciler::new(Arc::new(groups.clone()), Notifier::new(bus));

    let users = vec![a_user.clone(), b_user.clone(), neither.clone()];
    reconciler
        .reconcile(RunId::new(), &users, &rules, true)
        .await
        .unwrap();

    assert_eq!(groups.members("exec"), HashSet::from([a_user.id]));
    assert_eq!(groups.members("crew"), HashSet::from([a_user.id, b_user.id]));
}

// =============================================================================
// Missing Groups
// =============================================================================

#[tokio::test]
async fn test_missing_group_does_not_abort_run() {
    let member = user_with(&[
        ("status_code[1003]", FlagValue::True),
        ("status_code[4002]", FlagValue::True),
    ]);

    // "exec" does not exist; "it_team" and "crew" do.
    let groups = InMemoryGroups::with_groups(&["it_team", "crew"]);
    let bus = Arc::new(RecordingBus::default());
    let reconciler = Reconciler::new(Arc::new(groups.clone()), Notifier::new(bus));

    let users = vec![member.clone()];
    let stats = reconciler
        .reconcile(RunId::new(), &users, &RuleSet::builtin(), true)
        .await
        .unwrap();

    assert_eq!(groups.members("it_team"), HashSet::from([member.id]));
    assert_eq!(groups.members("crew"), HashSet::from([member.id]));
    // Every rule without a backing group was skipped, not failed.
    assert_eq!(stats.rules_skipped as usize, RuleSet::builtin().len() - 2);
}

// =============================================================================
// Selection Scoping
// =============================================================================

#[tokio::test]
async fn test_explicit_selection_leaves_other_users_untouched() {
    let in_scope = user_with(&[("status_code[1003]", FlagValue::True)]);
    // Out of scope: qualifies for exec but was never added.
    let out_of_scope = user_with(&[("status_code[1003]", FlagValue::True)]);

    let groups = InMemoryGroups::with_groups(&["exec", "crew"]);
    let bus = Arc::new(RecordingBus::default());
    let (service, _) = make_service(
        vec![in_scope.clone(), out_of_scope.clone()],
        &groups,
        &bus,
        true,
    );

    let processed = service
        .run(Selection::Explicit(vec![in_scope.id]))
        .await
        .unwrap();

    assert_eq!(processed, vec![in_scope.id]);
    assert!(groups.members("exec").contains(&in_scope.id));
    assert!(
        !groups.members("exec").contains(&out_of_scope.id),
        "users outside the explicit list stay untouched even when out of sync"
    );
}

// =============================================================================
// Feature Gate
// =============================================================================

#[tokio::test]
async fn test_disabled_feature_is_complete_noop() {
    let member = user_with(&[("status_code[1003]", FlagValue::True)]);
    let groups = InMemoryGroups::with_groups(&["exec", "crew"]);
    let bus = Arc::new(RecordingBus::default());
    let (service, directory) = make_service(vec![member], &groups, &bus, false);

    let processed = service.run(Selection::FullPopulation).await.unwrap();

    assert!(processed.is_empty());
    assert_eq!(
        directory.list_all_calls.load(Ordering::SeqCst),
        0,
        "no selection happens when the gate is closed"
    );
    assert_eq!(groups.mutation_count(), 0);
    assert!(bus.published_on(GroupsSynced::TOPIC).is_empty());
}

// =============================================================================
// Failure Handling
// =============================================================================

#[tokio::test]
async fn test_store_failure_aborts_without_rollback() {
    let member = user_with(&[("status_code[1003]", FlagValue::True)]);

    let groups = InMemoryGroups::with_groups(&["crew", "exec"]);
    groups.fail_add_for("exec");

    let bus = Arc::new(RecordingBus::default());
    let (service, _) = make_service(vec![member.clone()], &groups, &bus, true);

    let err = service.run(Selection::FullPopulation).await.unwrap_err();
    assert!(matches!(err, SyncError::MembershipStore { .. }));
    assert!(err.is_transient());

    // The crew add (processed before exec in rule order) stays applied.
    assert!(groups.members("crew").contains(&member.id));
    // An aborted run publishes no completion event.
    assert!(bus.published_on(GroupsSynced::TOPIC).is_empty());
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_explicit_run_enumerates_users_in_notification() {
    let member = user_with(&[("status_code[1003]", FlagValue::True)]);
    let groups = InMemoryGroups::with_groups(&["exec", "crew"]);
    let bus = Arc::new(RecordingBus::default());
    let (service, _) = make_service(vec![member.clone()], &groups, &bus, true);

    service
        .run(Selection::Explicit(vec![member.id]))
        .await
        .unwrap();

    let published = bus.published_on(GroupsSynced::TOPIC);
    assert_eq!(published.len(), 1);
    let user_ids = published[0]["payload"]["user_ids"].as_array().unwrap();
    assert_eq!(user_ids.len(), 1);
    assert_eq!(user_ids[0].as_str(), Some(member.id.to_string().as_str()));
}

#[tokio::test]
async fn test_full_run_publishes_empty_user_list() {
    let member = user_with(&[("status_code[1003]", FlagValue::True)]);
    let groups = InMemoryGroups::with_groups(&["exec", "crew"]);
    let bus = Arc::new(RecordingBus::default());
    let (service, _) = make_service(vec![member], &groups, &bus, true);

    service.run(Selection::FullPopulation).await.unwrap();

    let published = bus.published_on(GroupsSynced::TOPIC);
    assert_eq!(published.len(), 1);
    assert!(published[0]["payload"]["user_ids"]
        .as_array()
        .unwrap()
        .is_empty());
}

// =============================================================================
// Debounced Triggers
// =============================================================================

#[tokio::test]
async fn test_debouncer_coalesces_triggers_into_one_flush() {
    let first = user_with(&[("status_code[1003]", FlagValue::True)]);
    let second = user_with(&[("status_code[4001]", FlagValue::True)]);

    let groups = InMemoryGroups::with_groups(&["exec", "tech_team", "crew"]);
    let bus = Arc::new(RecordingBus::default());
    let (service, _) = make_service(vec![first.clone(), second.clone()], &groups, &bus, true);

    let scheduler = Arc::new(RecordingScheduler::default());
    let debouncer = Arc::new(Debouncer::new(
        service,
        scheduler.clone(),
        Duration::from_millis(10),
    ));
    let handler = FlagsChangedHandler::new(debouncer.clone());

    // Three near-simultaneous triggers for two users.
    handler.handle(raw_flags_changed(first.id)).await.unwrap();
    handler.handle(raw_flags_changed(second.id)).await.unwrap();
    handler.handle(raw_flags_changed(first.id)).await.unwrap();

    assert_eq!(
        scheduler.delayed.lock().unwrap().len(),
        1,
        "repeated triggers arm exactly one flush"
    );
    assert_eq!(debouncer.pending_count().await, 2);

    // Fire the flush the way the external scheduler would.
    let flush = scheduler.delayed.lock().unwrap()[0].1.clone();
    flush.execute().await.unwrap();

    assert_eq!(debouncer.pending_count().await, 0);
    assert!(groups.members("exec").contains(&first.id));
    assert!(groups.members("tech_team").contains(&second.id));

    // The next trigger after a flush arms a fresh flush.
    handler.handle(raw_flags_changed(first.id)).await.unwrap();
    assert_eq!(scheduler.delayed.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_handler_rejects_foreign_envelope() {
    let groups = InMemoryGroups::with_groups(&[]);
    let bus = Arc::new(RecordingBus::default());
    let (service, _) = make_service(vec![], &groups, &bus, true);

    let scheduler = Arc::new(RecordingScheduler::default());
    let debouncer = Arc::new(Debouncer::new(
        service,
        scheduler,
        Duration::from_millis(10),
    ));
    let handler = FlagsChangedHandler::new(debouncer);

    let mut raw = raw_flags_changed(UserId::new());
    raw.event_type = "other.system.event".to_string();

    let err = handler.handle(raw).await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidEvent(_)));
}

// =============================================================================
// Job Registration
// =============================================================================

#[tokio::test]
async fn test_register_jobs_wires_all_trigger_sources() {
    let groups = InMemoryGroups::with_groups(&[]);
    let bus = Arc::new(RecordingBus::default());
    let (service, _) = make_service(vec![], &groups, &bus, true);
    let config = service.config().clone();

    let scheduler = Arc::new(RecordingScheduler::default());
    register_jobs(scheduler.clone(), service);

    let periodic = scheduler.periodic.lock().unwrap();
    assert_eq!(periodic.len(), 2);
    assert_eq!(periodic[0].0, config.incremental_interval());
    assert_eq!(periodic[0].1.name(), "groupsync.incremental");
    assert_eq!(periodic[1].0, config.full_interval());
    assert_eq!(periodic[1].1.name(), "groupsync.full");

    let subscriptions = scheduler.subscriptions.lock().unwrap();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].0, MemberFlagsChanged::TOPIC);
}
