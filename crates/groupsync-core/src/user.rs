//! User read model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flags::FlagValue;
use crate::ids::UserId;

/// Snapshot of a user account as read from the external identity system.
///
/// The sync engine only reads this; user accounts are owned and mutated by
/// the external directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Account identifier.
    pub id: UserId,

    /// Attribute flags recorded on the account, keyed by flag identifier.
    /// Flags never recorded for the account are simply absent.
    #[serde(default)]
    pub flags: HashMap<String, FlagValue>,

    /// When the external record was last updated. Drives the
    /// recently-changed selection window.
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a record with no flags set.
    #[must_use]
    pub fn new(id: UserId, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            flags: HashMap::new(),
            updated_at,
        }
    }

    /// Look up a flag value; absent flags read as `Unset`.
    #[must_use]
    pub fn flag(&self, name: &str) -> FlagValue {
        self.flags.get(name).copied().unwrap_or_default()
    }

    /// Set a flag value, builder-style.
    #[must_use]
    pub fn with_flag(mut self, name: &str, value: FlagValue) -> Self {
        self.flags.insert(name.to_string(), value);
        self
    }
}
