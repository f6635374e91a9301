//! Tri-state attribute flag values.
//!
//! The external identity system stores membership attribute flags as
//! string-encoded booleans on user accounts: `"true"`, `"false"`, or no
//! value at all. This module decodes them into an explicit tri-state enum
//! at the storage boundary so the rest of the engine never touches the
//! string encoding.

use serde::{Deserialize, Serialize};

/// Value of a single attribute flag on a user account.
///
/// `Unset` and `False` are indistinguishable to rule evaluation: only
/// `True` makes a user eligible for a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagValue {
    /// Flag is present and set.
    True,
    /// Flag is present and cleared.
    False,
    /// Flag was never recorded for this account.
    #[default]
    Unset,
}

impl FlagValue {
    /// Decode a stored flag value.
    ///
    /// `None` and unrecognized strings both map to `Unset`.
    #[must_use]
    pub fn from_stored(raw: Option<&str>) -> Self {
        match raw {
            Some("true") => Self::True,
            Some("false") => Self::False,
            _ => Self::Unset,
        }
    }

    /// Whether this value satisfies a rule flag.
    #[must_use]
    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Unset => "unset",
        }
    }
}

impl std::fmt::Display for FlagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
