//! Trigger wiring: scheduled jobs, the debounced event trigger, and
//! declarative registration with the external job infrastructure.
//!
//! Three trigger sources feed the same [`SyncService`]:
//!
//! - a periodic incremental job over the recently-changed window,
//! - a periodic full-population job as the eventual-consistency backstop,
//! - a debounced, event-triggered job over explicit user ids.
//!
//! Concurrently scheduled runs over overlapping users are not serialized.
//! Every membership operation is idempotent and the periodic full run
//! corrects any update lost to a race, so the trigger layer carries no
//! cross-run state beyond the debounce buffer.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use groupsync_core::UserId;
use groupsync_events::events::MemberFlagsChanged;
use groupsync_events::{Event, RawEnvelope};

use crate::error::SyncResult;
use crate::selection::Selection;
use crate::service::SyncService;
use crate::traits::{EventHandler, JobScheduler, ScheduledJob};

/// Periodic catch-up over users whose record changed recently.
pub struct IncrementalSyncJob {
    service: Arc<SyncService>,
}

impl IncrementalSyncJob {
    /// Create the job.
    #[must_use]
    pub fn new(service: Arc<SyncService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ScheduledJob for IncrementalSyncJob {
    fn name(&self) -> &'static str {
        "groupsync.incremental"
    }

    async fn execute(&self) -> SyncResult<()> {
        let window = self.service.config().recent_window();
        self.service
            .run(Selection::RecentlyChanged { window })
            .await?;
        Ok(())
    }
}

/// Periodic full-population sweep.
///
/// Runs on a long period regardless of whether incremental runs succeeded,
/// so any membership drift is bounded by one period.
pub struct FullSyncJob {
    service: Arc<SyncService>,
}

impl FullSyncJob {
    /// Create the job.
    #[must_use]
    pub fn new(service: Arc<SyncService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ScheduledJob for FullSyncJob {
    fn name(&self) -> &'static str {
        "groupsync.full"
    }

    async fn execute(&self) -> SyncResult<()> {
        self.service.run(Selection::FullPopulation).await?;
        Ok(())
    }
}

/// Buffer shared between the debouncer and its flush job.
struct DebounceState {
    pending: Mutex<HashSet<UserId>>,
    flush_armed: AtomicBool,
}

/// One-shot job that drains the debounce buffer into an explicit run.
pub struct FlushPendingJob {
    service: Arc<SyncService>,
    state: Arc<DebounceState>,
}

#[async_trait]
impl ScheduledJob for FlushPendingJob {
    fn name(&self) -> &'static str {
        "groupsync.flush_pending"
    }

    async fn execute(&self) -> SyncResult<()> {
        // Disarm before draining so a trigger arriving mid-flush schedules
        // a fresh flush rather than being dropped.
        self.state.flush_armed.store(false, Ordering::SeqCst);

        let user_ids: Vec<UserId> = {
            let mut pending = self.state.pending.lock().await;
            pending.drain().collect()
        };

        if user_ids.is_empty() {
            return Ok(());
        }

        debug!(count = user_ids.len(), "Flushing debounced sync triggers");
        self.service.run(Selection::Explicit(user_ids)).await?;
        Ok(())
    }
}

/// Coalesces rapid repeated triggers into one explicit run.
///
/// The first push after an idle period arms a single delayed flush; pushes
/// arriving before the flush fires join the same batch.
pub struct Debouncer {
    state: Arc<DebounceState>,
    scheduler: Arc<dyn JobScheduler>,
    flush: Arc<FlushPendingJob>,
    delay: Duration,
}

impl Debouncer {
    /// Create a debouncer that flushes through `scheduler` after `delay`.
    #[must_use]
    pub fn new(
        service: Arc<SyncService>,
        scheduler: Arc<dyn JobScheduler>,
        delay: Duration,
    ) -> Self {
        let state = Arc::new(DebounceState {
            pending: Mutex::new(HashSet::new()),
            flush_armed: AtomicBool::new(false),
        });
        let flush = Arc::new(FlushPendingJob {
            service,
            state: state.clone(),
        });
        Self {
            state,
            scheduler,
            flush,
            delay,
        }
    }

    /// Record a user as needing sync and arm the flush if idle.
    pub async fn push(&self, user_id: UserId) {
        {
            let mut pending = self.state.pending.lock().await;
            pending.insert(user_id);
        }

        if !self.state.flush_armed.swap(true, Ordering::SeqCst) {
            self.scheduler
                .schedule_after_delay(self.delay, self.flush.clone());
        }
    }

    /// Number of users waiting for the next flush.
    pub async fn pending_count(&self) -> usize {
        self.state.pending.lock().await.len()
    }
}

/// Bus subscription that feeds flag-change events into the debouncer.
pub struct FlagsChangedHandler {
    debouncer: Arc<Debouncer>,
}

impl FlagsChangedHandler {
    /// Create the handler.
    #[must_use]
    pub fn new(debouncer: Arc<Debouncer>) -> Self {
        Self { debouncer }
    }
}

#[async_trait]
impl EventHandler for FlagsChangedHandler {
    async fn handle(&self, envelope: RawEnvelope) -> SyncResult<()> {
        envelope.validate()?;
        let typed = envelope.into_typed::<MemberFlagsChanged>()?;
        self.debouncer.push(typed.payload.user_id).await;
        Ok(())
    }
}

/// Register all trigger sources with the external job infrastructure.
pub fn register_jobs(scheduler: Arc<dyn JobScheduler>, service: Arc<SyncService>) {
    let config = service.config().clone();

    scheduler.schedule_periodic(
        config.incremental_interval(),
        Arc::new(IncrementalSyncJob::new(service.clone())),
    );
    scheduler.schedule_periodic(
        config.full_interval(),
        Arc::new(FullSyncJob::new(service.clone())),
    );

    let debouncer = Arc::new(Debouncer::new(
        service,
        scheduler.clone(),
        config.debounce_delay(),
    ));
    scheduler.subscribe(
        MemberFlagsChanged::TOPIC,
        Arc::new(FlagsChangedHandler::new(debouncer)),
    );
}
