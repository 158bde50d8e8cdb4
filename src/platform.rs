//! Target platform capability interface.
//!
//! The reconciled side of a sync: a GitLab-like platform exposing groups,
//! members, and role levels. The REST client, pagination loops, rate-limit
//! handling, and retries all live in the implementation; the engine drives
//! only the operations below and treats a returned error as terminal for
//! the calling scope.

use crate::access::AccessLevel;
use crate::context::RunContext;
use crate::error::PlatformError;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Platform-assigned group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform-assigned account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visibility of a newly created group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Private,
    Internal,
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Visibility::Private => "private",
            Visibility::Internal => "internal",
            Visibility::Public => "public",
        };
        write!(f, "{}", name)
    }
}

/// A group as known to the target platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    /// Platform-assigned id.
    pub id: GroupId,
    /// Exact group name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Group visibility.
    pub visibility: Visibility,
}

/// Parameters for creating a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroup {
    /// Exact group name (also used as the path).
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Visibility for the new group.
    pub visibility: Visibility,
}

impl NewGroup {
    /// Create-group parameters with an empty description.
    pub fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            visibility,
        }
    }
}

/// One member of a target group, with the role it currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Normalized login identity.
    pub identity: Identity,
    /// Role level the member currently holds.
    pub access_level: AccessLevel,
}

/// Capability interface over the reconciled platform.
///
/// Implementations must be safe to share read-only across concurrent group
/// workers; pagination happens inside `list_groups` and
/// `list_group_members`, which return the fully assembled listing.
/// Filtering protected accounts out of member listings is the caller's
/// job, not the adapter's.
pub trait TargetPlatform {
    /// List all groups visible to the sync account.
    fn list_groups(
        &self,
        context: &RunContext,
    ) -> impl Future<Output = Result<Vec<GroupRef>, PlatformError>> + Send;

    /// Look up a group by exact name. `None` means the group does not
    /// exist, which is an expected outcome rather than an error.
    fn get_group(
        &self,
        name: &str,
        context: &RunContext,
    ) -> impl Future<Output = Result<Option<GroupRef>, PlatformError>> + Send;

    /// Create a group.
    ///
    /// A [`PlatformError::Conflict`] means the group already exists; the
    /// engine treats that as a lost race and re-resolves by name.
    fn create_group(
        &self,
        group: &NewGroup,
        context: &RunContext,
    ) -> impl Future<Output = Result<GroupRef, PlatformError>> + Send;

    /// List current members of a group, in the platform's listing order.
    fn list_group_members(
        &self,
        group: GroupId,
        context: &RunContext,
    ) -> impl Future<Output = Result<Vec<GroupMember>, PlatformError>> + Send;

    /// Resolve an identity to its platform account id. `None` means the
    /// platform has no account for this identity.
    fn find_account_id(
        &self,
        identity: &Identity,
        context: &RunContext,
    ) -> impl Future<Output = Result<Option<AccountId>, PlatformError>> + Send;

    /// Add an account to a group at the given level.
    fn add_member(
        &self,
        group: GroupId,
        account: AccountId,
        level: AccessLevel,
        context: &RunContext,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Remove an account from a group.
    fn remove_member(
        &self,
        group: GroupId,
        account: AccountId,
        context: &RunContext,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;
}
