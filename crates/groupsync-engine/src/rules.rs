//! Group eligibility rules.
//!
//! A rule maps a group name to the set of attribute flags that grant
//! membership. Flags are OR-combined: a user qualifies when any one of the
//! rule's flags is true on their account. The `crew` rule is derived: its
//! flag set is the union of every other rule's flags plus a fixed extra
//! list, so changing any base rule changes crew eligibility on the next
//! build.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use groupsync_core::UserRecord;

/// Name of the derived rule.
pub const COMPOSITE_RULE_NAME: &str = "crew";

/// Compiled-in base rule table: group name to qualifying flags.
const BUILTIN_RULES: &[(&str, &[&str])] = &[
    ("exec", &["status_code[1003]"]),
    ("it_team", &["status_code[4002]"]),
    (
        "q_proj",
        &["status_code[3010]", "status_code[3009]", "status_code[3011]"],
    ),
    ("t_proj", &["status_code[3006]"]),
    ("duty_managers", &["status_code[3005]"]),
    ("t_dm", &["status_code[3003]"]),
    ("editors", &["status_code[4004]"]),
    ("tech_team", &["status_code[4001]"]),
];

/// Flags that grant crew membership on their own, in addition to every
/// flag appearing in a base rule.
const CREW_EXTRA_FLAGS: &[&str] = &[
    "status_code[3002]",
    "status_code[3001]",
    "status_code[1004]",
    "status_code[1002]",
];

/// Eligibility rule for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRule {
    /// Target group name; unique key within a rule set.
    pub name: String,
    /// Qualifying attribute flags, OR-combined.
    pub flags: Vec<String>,
}

impl GroupRule {
    /// Create a rule from a name and flag list.
    #[must_use]
    pub fn new(name: impl Into<String>, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            flags: flags.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the user qualifies for this rule's group.
    ///
    /// True iff any flag in the rule is exactly true on the user; unset and
    /// false flags never satisfy. Short-circuits on the first match, and
    /// the flag order never changes the outcome (pure disjunction).
    #[must_use]
    pub fn matches(&self, user: &UserRecord) -> bool {
        self.flags.iter().any(|flag| user.flag(flag).is_true())
    }
}

/// Immutable group-to-predicate table.
///
/// Built fresh at the start of every run and passed explicitly into the
/// reconciler; nothing in the engine mutates it after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeMap<String, GroupRule>,
}

impl RuleSet {
    /// Build the compiled-in rule table, including the derived `crew`
    /// entry. Deterministic and side-effect-free: two builds compare equal.
    #[must_use]
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(name, flags)| GroupRule::new(*name, flags.iter().copied()));
        Self::with_rules(rules, CREW_EXTRA_FLAGS.iter().copied())
    }

    /// Build a rule set from base rules, deriving the composite entry from
    /// the supplied table.
    ///
    /// The composite flag set is the extra flags followed by the union of
    /// every base rule's flags, deduplicated. A base rule named like the
    /// composite is replaced by the derived entry.
    #[must_use]
    pub fn with_rules(
        base: impl IntoIterator<Item = GroupRule>,
        extra_crew_flags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut rules: BTreeMap<String, GroupRule> = base
            .into_iter()
            .filter(|r| r.name != COMPOSITE_RULE_NAME)
            .map(|r| (r.name.clone(), r))
            .collect();

        let mut crew_flags: Vec<String> =
            extra_crew_flags.into_iter().map(Into::into).collect();
        for rule in rules.values() {
            for flag in &rule.flags {
                if !crew_flags.contains(flag) {
                    crew_flags.push(flag.clone());
                }
            }
        }

        rules.insert(
            COMPOSITE_RULE_NAME.to_string(),
            GroupRule::new(COMPOSITE_RULE_NAME, crew_flags),
        );

        Self { rules }
    }

    /// Look up a rule by group name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GroupRule> {
        self.rules.get(name)
    }

    /// Iterate over all rules in deterministic (name) order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupRule> {
        self.rules.values()
    }

    /// Number of rules, including the composite entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set contains no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
