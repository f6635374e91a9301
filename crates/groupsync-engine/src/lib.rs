//! # Group Sync Engine
//!
//! Keeps named group memberships consistent with boolean attribute flags
//! recorded on user accounts in an external identity system.
//!
//! ## Overview
//!
//! The engine provides:
//! - A declarative rule table mapping group names to eligibility flags,
//!   including one derived composite rule
//! - Per-user rule evaluation over tri-state attribute flags
//! - Diff/apply reconciliation that mutates membership only where actual
//!   and desired state disagree
//! - Two-tier scheduling: debounced event-triggered syncs, a periodic
//!   recently-changed catch-up, and a daily full-population backstop
//! - Best-effort completion events for external listeners
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SyncService                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌───────────┐    ┌───────────┐    ┌────────────┐            │
//! │  │ Selection │───►│  RuleSet  │───►│ Reconciler │            │
//! │  │  Policy   │    │           │    │            │            │
//! │  └─────┬─────┘    └───────────┘    └─────┬──────┘            │
//! │        │                                 │                   │
//! │        ▼                                 ▼                   │
//! │  ┌───────────┐                     ┌────────────┐   ┌──────┐ │
//! │  │   User    │                     │   Group    │   │ Bus  │ │
//! │  │ Directory │                     │ Directory  │   │      │ │
//! │  └───────────┘                     └────────────┘   └──────┘ │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage, scheduling infrastructure, and the bus transport are external;
//! the engine consumes them through the traits in [`traits`].
//!
//! ## Usage
//!
//! ```ignore
//! use groupsync_engine::{register_jobs, Selection, SyncConfig, SyncService};
//!
//! let service = Arc::new(SyncService::new(users, groups, bus, feature, SyncConfig::default())?);
//!
//! // Declarative trigger registration
//! register_jobs(scheduler, service.clone());
//!
//! // Or a one-off run
//! let processed = service.run(Selection::FullPopulation).await?;
//! ```

pub mod config;
pub mod error;
pub mod jobs;
pub mod notify;
pub mod reconcile;
pub mod rules;
pub mod selection;
pub mod service;
pub mod stats;
pub mod traits;

// Re-exports for convenience
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use jobs::{
    register_jobs, Debouncer, FlagsChangedHandler, FlushPendingJob, FullSyncJob,
    IncrementalSyncJob,
};
pub use notify::Notifier;
pub use reconcile::Reconciler;
pub use rules::{GroupRule, RuleSet, COMPOSITE_RULE_NAME};
pub use selection::Selection;
pub use service::SyncService;
pub use stats::RunStatistics;
pub use traits::{
    EventHandler, FeatureFlag, GroupDirectory, GroupHandle, JobScheduler, ScheduledJob,
    UserDirectory,
};
