//! Sync configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Scheduling configuration for the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How often the recently-changed catch-up job runs (in seconds).
    #[serde(default = "default_incremental_interval")]
    pub incremental_interval_secs: u64,

    /// Look-back window for the recently-changed selection (in seconds).
    /// Must exceed the incremental interval so timer jitter cannot open a
    /// gap between consecutive windows.
    #[serde(default = "default_recent_window")]
    pub recent_window_secs: u64,

    /// How often the full-population backstop job runs (in seconds).
    #[serde(default = "default_full_interval")]
    pub full_interval_secs: u64,

    /// How long an event-triggered sync waits to batch further triggers
    /// (in milliseconds).
    #[serde(default = "default_debounce_delay")]
    pub debounce_delay_ms: u64,
}

fn default_incremental_interval() -> u64 {
    600
}

fn default_recent_window() -> u64 {
    720
}

fn default_full_interval() -> u64 {
    86_400
}

fn default_debounce_delay() -> u64 {
    10_000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            incremental_interval_secs: default_incremental_interval(),
            recent_window_secs: default_recent_window(),
            full_interval_secs: default_full_interval(),
            debounce_delay_ms: default_debounce_delay(),
        }
    }
}

impl SyncConfig {
    /// Incremental job period.
    #[must_use]
    pub fn incremental_interval(&self) -> Duration {
        Duration::from_secs(self.incremental_interval_secs)
    }

    /// Recently-changed selection window.
    #[must_use]
    pub fn recent_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.recent_window_secs as i64)
    }

    /// Full-population job period.
    #[must_use]
    pub fn full_interval(&self) -> Duration {
        Duration::from_secs(self.full_interval_secs)
    }

    /// Debounce delay for event-triggered syncs.
    #[must_use]
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    /// Check that this configuration is usable.
    pub fn validate(&self) -> SyncResult<()> {
        if self.incremental_interval_secs == 0 {
            return Err(SyncError::invalid_config(
                "Incremental interval must be at least 1 second",
            ));
        }
        if self.full_interval_secs == 0 {
            return Err(SyncError::invalid_config(
                "Full sync interval must be at least 1 second",
            ));
        }
        if self.recent_window_secs <= self.incremental_interval_secs {
            return Err(SyncError::invalid_config(
                "Recently-changed window must exceed the incremental interval",
            ));
        }
        Ok(())
    }
}
