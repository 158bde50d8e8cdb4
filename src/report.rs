//! Per-group outcomes and the aggregated run report.
//!
//! Every discovered group produces exactly one [`GroupOutcome`]; the
//! orchestrator aggregates them into a [`RunReport`] handed to the caller.
//! Nothing here is persisted between runs; the report is the only thing
//! that outlives a run.

use crate::error::ErrorKind;
use crate::identity::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the per-group state machine at which a group-level failure
/// occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Looking up the target group by name.
    Resolve,
    /// Creating the missing target group.
    Create,
    /// Fetching current or desired members.
    Fetch,
    /// Applying the computed delta.
    Apply,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolve => "resolve",
            Stage::Create => "create",
            Stage::Fetch => "fetch",
            Stage::Apply => "apply",
        };
        write!(f, "{}", name)
    }
}

/// One recorded failure, either group-level (`identity: None`) or scoped to
/// a single member operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFailure {
    /// The member the failure is scoped to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    /// Stage for group-level failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Failure classification.
    pub kind: ErrorKind,
    /// Human-readable detail from the adapter or engine.
    pub message: String,
}

impl SyncFailure {
    /// A failure that aborted the group's state machine.
    pub fn group(stage: Stage, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            identity: None,
            stage: Some(stage),
            kind,
            message: message.into(),
        }
    }

    /// A failure scoped to one member operation.
    pub fn member(identity: Identity, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            identity: Some(identity),
            stage: None,
            kind,
            message: message.into(),
        }
    }
}

/// The complete result of reconciling one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutcome {
    /// The source's canonical group name.
    pub group_name: String,
    /// True if the engine created the target group this run.
    pub created: bool,
    /// True if the desired set was empty against a non-empty current set.
    pub full_drain: bool,
    /// True if the group's delta was not applied (drain guard, cancellation,
    /// or a group-level failure before the apply stage).
    pub skipped: bool,
    /// Members successfully added, in application order.
    pub added: Vec<Identity>,
    /// Members successfully removed, in application order.
    pub removed: Vec<Identity>,
    /// Group-level and member-level failures, in occurrence order.
    pub failures: Vec<SyncFailure>,
}

impl GroupOutcome {
    /// Fresh outcome for a discovered group.
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            created: false,
            full_drain: false,
            skipped: false,
            added: Vec::new(),
            removed: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Outcome for a group that was never dispatched (run cancelled).
    pub fn cancelled(group_name: impl Into<String>) -> Self {
        let mut outcome = Self::new(group_name);
        outcome.skipped = true;
        outcome
    }

    /// Record a group-level failure and mark the group skipped.
    pub fn fail_group(&mut self, stage: Stage, kind: ErrorKind, message: impl Into<String>) {
        self.skipped = true;
        self.failures.push(SyncFailure::group(stage, kind, message));
    }

    /// Record a member-level failure; the group keeps processing.
    pub fn fail_member(&mut self, identity: Identity, kind: ErrorKind, message: impl Into<String>) {
        self.failures
            .push(SyncFailure::member(identity, kind, message));
    }

    /// True if no failure of any scope was recorded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregated result of one reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier, matching the [`RunContext`](crate::RunContext) the
    /// adapters saw.
    pub run_id: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished (including cancellation drain).
    pub finished_at: DateTime<Utc>,
    /// True if the run was cancelled before all groups were dispatched.
    pub cancelled: bool,
    /// One outcome per discovered group, in source discovery order.
    pub outcomes: Vec<GroupOutcome>,
}

impl RunReport {
    /// Number of groups discovered.
    pub fn groups_discovered(&self) -> usize {
        self.outcomes.len()
    }

    /// Total members added across all groups.
    pub fn total_added(&self) -> usize {
        self.outcomes.iter().map(|o| o.added.len()).sum()
    }

    /// Total members removed across all groups.
    pub fn total_removed(&self) -> usize {
        self.outcomes.iter().map(|o| o.removed.len()).sum()
    }

    /// Total failures of any scope.
    pub fn total_failures(&self) -> usize {
        self.outcomes.iter().map(|o| o.failures.len()).sum()
    }

    /// True if every group completed without failures.
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(GroupOutcome::is_clean)
    }

    /// Outcome for a group by name, if it was discovered.
    pub fn outcome(&self, group_name: &str) -> Option<&GroupOutcome> {
        self.outcomes.iter().find(|o| o.group_name == group_name)
    }
}

impl fmt::Display for RunReport {
    /// Human-readable summary for operators: per group, what was added,
    /// removed, and what failed with reasons.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run {}: {} group(s), +{} -{} member(s), {} failure(s){}",
            self.run_id,
            self.groups_discovered(),
            self.total_added(),
            self.total_removed(),
            self.total_failures(),
            if self.cancelled { " [cancelled]" } else { "" },
        )?;
        for outcome in &self.outcomes {
            let mut flags = Vec::new();
            if outcome.created {
                flags.push("created");
            }
            if outcome.full_drain {
                flags.push("full-drain");
            }
            if outcome.skipped {
                flags.push("skipped");
            }
            writeln!(
                f,
                "  {}: +{} -{}{}",
                outcome.group_name,
                outcome.added.len(),
                outcome.removed.len(),
                if flags.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", flags.join(", "))
                },
            )?;
            for failure in &outcome.failures {
                match (&failure.identity, failure.stage) {
                    (Some(identity), _) => {
                        writeln!(f, "    ! {} [{}]: {}", identity, failure.kind, failure.message)?
                    }
                    (None, Some(stage)) => writeln!(
                        f,
                        "    ! {} stage [{}]: {}",
                        stage, failure.kind, failure.message
                    )?,
                    (None, None) => {
                        writeln!(f, "    ! [{}]: {}", failure.kind, failure.message)?
                    }
                }
            }
        }
        Ok(())
    }
}
