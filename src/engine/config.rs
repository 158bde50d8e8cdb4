//! Engine configuration and builder.
//!
//! All policy the orchestrator consults lives in an explicit
//! [`EngineConfig`] passed in at construction; nothing is read from ambient
//! global state.

use crate::access::{AccessLevel, AccessRules};
use crate::error::{SyncError, SyncResult};
use crate::identity::Identity;
use crate::platform::Visibility;
use std::collections::HashSet;

/// Policy for a full drain: an existing group whose desired set is empty.
///
/// `Proceed` applies the removals and flags the outcome so operators can
/// audit it afterwards. `Skip` records the flag but issues no removals,
/// guarding an existing group against a misconfigured source filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Apply the removals; the outcome carries `full_drain: true`.
    #[default]
    Proceed,
    /// Flag the outcome and leave the group untouched.
    Skip,
}

/// Configuration for a [`SyncEngine`](crate::engine::SyncEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Source group filter, passed verbatim to the directory adapter.
    pub group_filter: String,
    /// Visibility for groups the engine has to create.
    pub default_visibility: Visibility,
    /// Ordered access-level inference rules.
    pub access_rules: AccessRules,
    /// Explicit access level applied to every addition, bypassing
    /// inference, when set.
    pub access_level_override: Option<AccessLevel>,
    /// Identities never considered for addition or removal, regardless of
    /// what either side lists.
    pub protected: HashSet<Identity>,
    /// Behavior when the desired set is empty for an existing group.
    pub drain_policy: DrainPolicy,
    /// Upper bound on concurrently processed groups. Must be at least 1;
    /// 1 yields fully sequential processing.
    pub max_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            group_filter: "(objectClass=group)".to_string(),
            default_visibility: Visibility::Private,
            access_rules: AccessRules::default(),
            access_level_override: None,
            protected: [Identity::new_unchecked("root".to_string())]
                .into_iter()
                .collect(),
            drain_policy: DrainPolicy::default(),
            max_concurrency: 4,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.max_concurrency == 0 {
            return Err(SyncError::InvalidConfig {
                message: "max_concurrency must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for [`SyncEngine`](crate::engine::SyncEngine) instances.
///
/// ```rust,no_run
/// use groupsync::{SyncEngineBuilder, DrainPolicy, Visibility};
/// # use groupsync::{DirectorySource, TargetPlatform};
/// # fn example<S, P>(source: S, platform: P) -> Result<(), groupsync::SyncError>
/// # where S: DirectorySource, P: TargetPlatform {
/// let engine = SyncEngineBuilder::new(source, platform)
///     .group_filter("(objectClass=group)")
///     .default_visibility(Visibility::Private)
///     .drain_policy(DrainPolicy::Skip)
///     .max_concurrency(8)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SyncEngineBuilder<S, P> {
    pub(super) source: S,
    pub(super) platform: P,
    pub(super) config: EngineConfig,
}

impl<S, P> SyncEngineBuilder<S, P> {
    /// Start a builder with default configuration.
    pub fn new(source: S, platform: P) -> Self {
        Self {
            source,
            platform,
            config: EngineConfig::default(),
        }
    }

    /// Set the source group filter.
    pub fn group_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.group_filter = filter.into();
        self
    }

    /// Set the visibility used when creating missing groups.
    pub fn default_visibility(mut self, visibility: Visibility) -> Self {
        self.config.default_visibility = visibility;
        self
    }

    /// Replace the access-level inference table.
    pub fn access_rules(mut self, rules: AccessRules) -> Self {
        self.config.access_rules = rules;
        self
    }

    /// Apply one explicit access level to every addition.
    pub fn access_level_override(mut self, level: AccessLevel) -> Self {
        self.config.access_level_override = Some(level);
        self
    }

    /// Replace the protected identity set.
    pub fn protected(mut self, identities: impl IntoIterator<Item = Identity>) -> Self {
        self.config.protected = identities.into_iter().collect();
        self
    }

    /// Add one identity to the protected set.
    pub fn protect(mut self, identity: Identity) -> Self {
        self.config.protected.insert(identity);
        self
    }

    /// Set the full-drain policy.
    pub fn drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.config.drain_policy = policy;
        self
    }

    /// Set the bound on concurrently processed groups.
    pub fn max_concurrency(mut self, bound: usize) -> Self {
        self.config.max_concurrency = bound;
        self
    }

    /// Validate the configuration and build the engine.
    pub fn build(self) -> SyncResult<crate::engine::SyncEngine<S, P>> {
        self.config.validate()?;
        Ok(crate::engine::SyncEngine::from_builder(self))
    }
}
