//! Error types for the sync engine.

use thiserror::Error;

use groupsync_events::EventError;

/// Errors that can occur during a reconciliation run.
///
/// Configuration gaps are not represented here: a missing target group and
/// an unknown user id are handled structurally (the rule or id is skipped)
/// and never surface as errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The user directory could not be read.
    #[error("User directory error: {cause}")]
    Directory { cause: String },

    /// A group membership read or write failed.
    #[error("Membership store error for group {group}: {cause}")]
    MembershipStore { group: String, cause: String },

    /// Sync configuration failed validation.
    #[error("Invalid sync configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A trigger event could not be decoded.
    #[error("Invalid trigger event: {0}")]
    InvalidEvent(#[from] EventError),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Build a user directory error.
    pub fn directory(cause: impl Into<String>) -> Self {
        Self::Directory {
            cause: cause.into(),
        }
    }

    /// Build a membership store error.
    pub fn membership_store(group: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::MembershipStore {
            group: group.into(),
            cause: cause.into(),
        }
    }

    /// Build a configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns true if the failure is expected to heal on a later
    /// scheduled run without intervention.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Directory { .. } | SyncError::MembershipStore { .. }
        )
    }
}
