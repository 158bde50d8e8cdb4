//! The reconciliation run loop.

use crate::context::RunContext;
use crate::delta::compute_delta;
use crate::engine::config::{DrainPolicy, EngineConfig, SyncEngineBuilder};
use crate::error::{ErrorKind, SyncResult};
use crate::identity::MemberSet;
use crate::platform::{GroupRef, NewGroup, TargetPlatform};
use crate::report::{GroupOutcome, RunReport, Stage};
use crate::source::{DirectorySource, SourceGroup};
use crate::access;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Handle for cancelling a run from outside (e.g. a signal handler).
///
/// Cancellation stops dispatching new groups; groups already in flight
/// finish or fail cleanly and are recorded in the report. Undispatched
/// groups appear in the report as skipped, so no discovered group is left
/// without an outcome.
///
/// Cancellation is scoped to one run: the request is consumed when the
/// run's report is assembled, so a later
/// [`reconcile`](SyncEngine::reconcile) on the same engine starts fresh.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request cancellation of the run.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Membership reconciliation engine.
///
/// Owns shared handles to the two adapters and the run configuration.
/// Each call to [`reconcile`](Self::reconcile) recomputes everything from
/// scratch; no state survives between runs except the returned
/// [`RunReport`].
pub struct SyncEngine<S, P> {
    source: Arc<S>,
    platform: Arc<P>,
    config: Arc<EngineConfig>,
    cancelled: Arc<AtomicBool>,
}

impl<S, P> SyncEngine<S, P> {
    pub(super) fn from_builder(builder: SyncEngineBuilder<S, P>) -> Self {
        Self {
            source: Arc::new(builder.source),
            platform: Arc::new(builder.platform),
            config: Arc::new(builder.config),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A handle that cancels this engine's in-progress run.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }
}

impl<S, P> SyncEngine<S, P>
where
    S: DirectorySource + Send + Sync + 'static,
    P: TargetPlatform + Send + Sync + 'static,
{
    /// Run one reconciliation pass with a generated run ID.
    pub async fn reconcile(&self) -> SyncResult<RunReport> {
        self.reconcile_with_context(RunContext::with_generated_id())
            .await
    }

    /// Run one reconciliation pass.
    ///
    /// Listing the source groups or the target groups failing is fatal to
    /// the run and surfaces as an error; nothing downstream could proceed.
    /// Every other failure is recovered locally and recorded in the
    /// returned report.
    pub async fn reconcile_with_context(&self, context: RunContext) -> SyncResult<RunReport> {
        let started_at = Utc::now();
        info!(
            "run {}: reconciling groups matching '{}'",
            context.run_id, self.config.group_filter
        );

        let source_groups = self
            .source
            .list_groups(&self.config.group_filter, &context)
            .await?;

        // One listing up front resolves most groups without a per-group
        // lookup and doubles as the fatal platform availability check.
        let target_groups = self.platform.list_groups(&context).await?;
        let resolved: HashMap<String, GroupRef> = target_groups
            .into_iter()
            .map(|group| (group.name.clone(), group))
            .collect();

        info!(
            "run {}: {} source group(s) discovered, {} target group(s) known",
            context.run_id,
            source_groups.len(),
            resolved.len()
        );

        let group_names: Vec<String> = source_groups.iter().map(|g| g.name.clone()).collect();
        let mut slots: Vec<Option<GroupOutcome>> = Vec::new();
        slots.resize_with(source_groups.len(), || None);

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut workers = JoinSet::new();

        for (index, group) in source_groups.into_iter().enumerate() {
            let source = Arc::clone(&self.source);
            let platform = Arc::clone(&self.platform);
            let config = Arc::clone(&self.config);
            let cancelled = Arc::clone(&self.cancelled);
            let semaphore = Arc::clone(&semaphore);
            let context = context.clone();
            let known = resolved.get(&group.name).cloned();

            workers.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, GroupOutcome::cancelled(group.name)),
                };
                if cancelled.load(Ordering::SeqCst) {
                    debug!(
                        "run {}: skipping group '{}', run cancelled",
                        context.run_id, group.name
                    );
                    return (index, GroupOutcome::cancelled(group.name));
                }
                let outcome =
                    process_group(&*source, &*platform, &config, &context, group, known).await;
                (index, outcome)
            });
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(err) => warn!("run {}: group worker aborted: {}", context.run_id, err),
            }
        }

        let outcomes: Vec<GroupOutcome> = slots
            .into_iter()
            .zip(group_names)
            .map(|(slot, name)| slot.unwrap_or_else(|| GroupOutcome::cancelled(name)))
            .collect();

        // Consume the cancellation request so the next run starts fresh.
        let cancelled = self.cancelled.swap(false, Ordering::SeqCst);
        let report = RunReport {
            run_id: context.run_id.clone(),
            started_at,
            finished_at: Utc::now(),
            cancelled,
            outcomes,
        };
        info!(
            "run {}: finished, +{} -{} member(s), {} failure(s)",
            report.run_id,
            report.total_added(),
            report.total_removed(),
            report.total_failures()
        );
        Ok(report)
    }
}

/// Drive one group through the per-group state machine.
///
/// Never returns an error: every failure is absorbed into the outcome so
/// the run continues with the next group.
async fn process_group<S, P>(
    source: &S,
    platform: &P,
    config: &EngineConfig,
    context: &RunContext,
    group: SourceGroup,
    known: Option<GroupRef>,
) -> GroupOutcome
where
    S: DirectorySource,
    P: TargetPlatform,
{
    let mut outcome = GroupOutcome::new(group.name.clone());

    // TargetResolved: use the prefetched listing, create on a miss. A
    // conflict on create means another writer won the race; re-resolve.
    let target = match known {
        Some(existing) => existing,
        None => {
            let new_group = NewGroup::new(group.name.clone(), config.default_visibility);
            match platform.create_group(&new_group, context).await {
                Ok(created) => {
                    info!(
                        "run {}: created group '{}' ({})",
                        context.run_id, created.name, created.visibility
                    );
                    outcome.created = true;
                    created
                }
                Err(err) if err.is_conflict() => {
                    match platform.get_group(&group.name, context).await {
                        Ok(Some(existing)) => existing,
                        Ok(None) => {
                            outcome.fail_group(
                                Stage::Create,
                                ErrorKind::PlatformConflict,
                                format!(
                                    "create of '{}' conflicted but the group is not resolvable",
                                    group.name
                                ),
                            );
                            return outcome;
                        }
                        Err(err) => {
                            outcome.fail_group(Stage::Resolve, err.kind(), err.to_string());
                            return outcome;
                        }
                    }
                }
                Err(err) => {
                    outcome.fail_group(Stage::Create, err.kind(), err.to_string());
                    return outcome;
                }
            }
        }
    };

    // MembersFetched: both sides, normalized and filtered through the
    // protected set so protected identities never enter the delta.
    let desired_raw = match source.list_members(&group.handle, context).await {
        Ok(members) => members,
        Err(err) => {
            outcome.fail_group(Stage::Fetch, err.kind(), err.to_string());
            return outcome;
        }
    };
    let current_raw = match platform.list_group_members(target.id, context).await {
        Ok(members) => members,
        Err(err) => {
            outcome.fail_group(Stage::Fetch, err.kind(), err.to_string());
            return outcome;
        }
    };
    let desired = MemberSet::from_members_excluding(desired_raw, &config.protected);
    let current = MemberSet::from_members_excluding(
        current_raw.into_iter().map(|member| member.identity),
        &config.protected,
    );

    // DeltaComputed
    let delta = compute_delta(&current, &desired);
    if delta.is_noop() {
        debug!(
            "run {}: group '{}' already converged",
            context.run_id, group.name
        );
        return outcome;
    }
    if delta.is_full_drain(&current) {
        outcome.full_drain = true;
        warn!(
            "run {}: group '{}' desired set is empty, full drain of {} member(s) detected",
            context.run_id,
            group.name,
            current.len()
        );
        if config.drain_policy == DrainPolicy::Skip {
            outcome.skipped = true;
            return outcome;
        }
    }

    // Applied: additions before removals, so the group never passes
    // through a transient empty state. Each member operation is
    // independently fallible.
    //
    // Only additions need an access level; a remove-only delta never
    // consults the inference rules, so a group whose name matches no rule
    // can still be drained.
    if !delta.to_add.is_empty() {
        let level = match access::resolve_access_level(
            &config.access_rules,
            &group.name,
            config.access_level_override,
        ) {
            Ok(level) => level,
            Err(err) => {
                outcome.fail_group(Stage::Apply, err.kind(), err.to_string());
                return outcome;
            }
        };

        for identity in delta.to_add {
            match platform.find_account_id(&identity, context).await {
                Ok(Some(account)) => {
                    match platform.add_member(target.id, account, level, context).await {
                        Ok(()) => {
                            debug!(
                                "run {}: added '{}' to '{}' as {}",
                                context.run_id, identity, group.name, level
                            );
                            outcome.added.push(identity);
                        }
                        Err(err) => {
                            warn!(
                                "run {}: failed to add '{}' to '{}': {}",
                                context.run_id, identity, group.name, err
                            );
                            outcome.fail_member(identity, err.kind(), err.to_string());
                        }
                    }
                }
                Ok(None) => {
                    let message = format!("no platform account for '{}'", identity);
                    outcome.fail_member(identity, ErrorKind::AccountNotFound, message);
                }
                Err(err) => outcome.fail_member(identity, err.kind(), err.to_string()),
            }
        }
    }

    for identity in delta.to_remove {
        match platform.find_account_id(&identity, context).await {
            Ok(Some(account)) => {
                match platform.remove_member(target.id, account, context).await {
                    Ok(()) => {
                        debug!(
                            "run {}: removed '{}' from '{}'",
                            context.run_id, identity, group.name
                        );
                        outcome.removed.push(identity);
                    }
                    Err(err) => {
                        warn!(
                            "run {}: failed to remove '{}' from '{}': {}",
                            context.run_id, identity, group.name, err
                        );
                        outcome.fail_member(identity, err.kind(), err.to_string());
                    }
                }
            }
            Ok(None) => {
                let message = format!("no platform account for '{}'", identity);
                outcome.fail_member(identity, ErrorKind::AccountNotFound, message);
            }
            Err(err) => outcome.fail_member(identity, err.kind(), err.to_string()),
        }
    }

    outcome
}
