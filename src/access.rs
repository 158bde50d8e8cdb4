//! Access-level resolution from group names.
//!
//! When no explicit level is supplied, the level a member is added with is
//! inferred from the group's name against an ordered substring rule table.
//! Rule order is part of the contract: the first matching rule wins.

use crate::error::{SyncError, SyncResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role level a member holds in a target group.
///
/// Numeric values follow the GitLab permission model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Guest,
    Reporter,
    Developer,
    Maintainer,
    Owner,
}

impl AccessLevel {
    /// Numeric level as used by the platform API.
    pub fn as_u8(self) -> u8 {
        match self {
            AccessLevel::Guest => 10,
            AccessLevel::Reporter => 20,
            AccessLevel::Developer => 30,
            AccessLevel::Maintainer => 40,
            AccessLevel::Owner => 50,
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessLevel::Guest => "Guest",
            AccessLevel::Reporter => "Reporter",
            AccessLevel::Developer => "Developer",
            AccessLevel::Maintainer => "Maintainer",
            AccessLevel::Owner => "Owner",
        };
        write!(f, "{}", name)
    }
}

/// Ordered table of `{substring → level}` inference rules.
///
/// Matching is case-insensitive and first-match-wins, so more specific
/// substrings must be listed before less specific ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRules {
    rules: Vec<(String, AccessLevel)>,
}

impl AccessRules {
    /// Create an empty rule table. Every resolution without an explicit
    /// level will fail with `UnsupportedRole`.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a table from ordered `(substring, level)` pairs.
    pub fn from_rules(rules: impl IntoIterator<Item = (String, AccessLevel)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(s, level)| (s.to_lowercase(), level))
                .collect(),
        }
    }

    /// Append a rule at the lowest priority position.
    pub fn push(&mut self, substring: impl Into<String>, level: AccessLevel) {
        self.rules.push((substring.into().to_lowercase(), level));
    }

    /// First rule whose substring occurs in `group_name`, case-insensitively.
    pub fn match_group_name(&self, group_name: &str) -> Option<AccessLevel> {
        let lowered = group_name.to_lowercase();
        self.rules
            .iter()
            .find(|(substring, _)| lowered.contains(substring))
            .map(|(_, level)| *level)
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for AccessRules {
    /// The stock table: `"maintainer"` → Maintainer, then `"developer"` →
    /// Developer.
    fn default() -> Self {
        Self::from_rules([
            ("maintainer".to_string(), AccessLevel::Maintainer),
            ("developer".to_string(), AccessLevel::Developer),
        ])
    }
}

/// Resolve the access level for members of `group_name`.
///
/// An explicit level always wins, with no inference. Otherwise the group
/// name is matched against `rules`; no match fails with
/// [`SyncError::UnsupportedRole`], which the orchestrator records as a
/// group-level failure.
///
/// Only additions carry a level, so the orchestrator calls this once per
/// group and only when its delta contains additions; removals proceed
/// without consulting the rules.
pub fn resolve_access_level(
    rules: &AccessRules,
    group_name: &str,
    explicit: Option<AccessLevel>,
) -> SyncResult<AccessLevel> {
    if let Some(level) = explicit {
        return Ok(level);
    }
    match rules.match_group_name(group_name) {
        Some(level) => {
            debug!("inferred access level {} for group '{}'", level, group_name);
            Ok(level)
        }
        None => Err(SyncError::UnsupportedRole {
            group_name: group_name.to_string(),
        }),
    }
}
