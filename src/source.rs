//! Directory source capability interface.
//!
//! The authoritative side of a sync: some enumerable membership provider
//! (an LDAP tree, a flat file, another API) that can list groups matching a
//! filter and list the member identities of each group. Connection
//! handling, the raw search protocol, pagination, and retry/backoff all
//! live in the implementation; the engine only sees these two operations.

use crate::context::RunContext;
use crate::error::DirectoryError;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Opaque handle for fetching a source group's members.
///
/// For an LDAP source this is typically the group's distinguished name; the
/// engine never interprets it, only passes it back to
/// [`DirectorySource::list_members`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceGroupHandle(String);

impl SourceGroupHandle {
    /// Wrap an implementation-specific locator.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The raw locator string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceGroupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A group discovered in the directory source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGroup {
    /// The source's canonical group label; also the exact name looked up in
    /// the target platform.
    pub name: String,
    /// Locator for the group's member listing.
    pub handle: SourceGroupHandle,
}

impl SourceGroup {
    /// Create a source group record.
    pub fn new(name: impl Into<String>, handle: SourceGroupHandle) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }
}

/// Capability interface over the authoritative membership source.
///
/// Implementations must be safe to share read-only across concurrent group
/// workers: no method may mutate shared connection state as a side effect
/// of being called concurrently. Transient failures should be retried with
/// bounded backoff inside the implementation; an error returned here is
/// treated as terminal for the calling scope.
pub trait DirectorySource {
    /// List groups matching `filter`, in the source's canonical order.
    ///
    /// The filter syntax is the source's own (e.g. an LDAP search filter);
    /// the engine passes it through verbatim.
    fn list_groups(
        &self,
        filter: &str,
        context: &RunContext,
    ) -> impl Future<Output = Result<Vec<SourceGroup>, DirectoryError>> + Send;

    /// List the member identities of one group, in the source's listing
    /// order.
    ///
    /// Implementations are responsible for mapping their native member
    /// representation (e.g. member DNs resolved to account-name attributes)
    /// into normalized [`Identity`] keys.
    fn list_members(
        &self,
        group: &SourceGroupHandle,
        context: &RunContext,
    ) -> impl Future<Output = Result<Vec<Identity>, DirectoryError>> + Send;
}
