//! Membership delta computation.
//!
//! [`compute_delta`] is the pure core of the engine: given the current and
//! desired member sets of one group it produces the exact additions and
//! removals that transform one into the other. No I/O, no policy; protected
//! accounts are excluded upstream when the current set is built.

use crate::identity::{Identity, MemberSet};
use serde::{Deserialize, Serialize};

/// The add/remove plan for one group.
///
/// `to_add` and `to_remove` are disjoint by construction. Ordering within
/// each is deterministic: `to_add` follows the desired set's listing order,
/// `to_remove` the current set's listing order, so repeated runs and tests
/// see identical sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// Identities present in the desired set but absent from the current one.
    pub to_add: Vec<Identity>,
    /// Identities present in the current set but absent from the desired one.
    pub to_remove: Vec<Identity>,
}

impl Delta {
    /// True if applying this delta would issue no mutations.
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// True if applying this delta to `current` would empty a previously
    /// populated group: no additions, and every current member removed.
    pub fn is_full_drain(&self, current: &MemberSet) -> bool {
        !current.is_empty() && self.to_add.is_empty() && self.to_remove.len() == current.len()
    }
}

/// Compute the minimal delta turning `current` into `desired`.
///
/// Deterministic for a given pair of sets. Identical sets yield an empty
/// delta, which is what makes a repeated run a no-op. An empty desired set
/// against a non-empty current set yields a full drain; whether that is
/// applied is the orchestrator's policy decision, not this function's.
pub fn compute_delta(current: &MemberSet, desired: &MemberSet) -> Delta {
    let to_add = desired
        .iter()
        .filter(|identity| !current.contains(identity))
        .cloned()
        .collect();
    let to_remove = current
        .iter()
        .filter(|identity| !desired.contains(identity))
        .cloned()
        .collect();
    Delta { to_add, to_remove }
}
