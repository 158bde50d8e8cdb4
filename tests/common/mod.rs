//! Shared in-memory fakes for engine integration tests.
//!
//! Both adapters are deterministic and support scripted failures so tests
//! can exercise every recovery path without a directory server or a REST
//! endpoint. State and call counters live behind `Arc` so a test can keep
//! a handle after moving the fake into the engine.

use groupsync::{
    AccessLevel, AccountId, DirectoryError, DirectorySource, GroupId, GroupMember, GroupRef,
    Identity, NewGroup, PlatformError, RunContext, SourceGroup, SourceGroupHandle, TargetPlatform,
    Visibility,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Route engine log output to the test harness when `RUST_LOG` is set.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn id(key: &str) -> Identity {
    Identity::new(key).unwrap()
}

fn handle_for(name: &str) -> String {
    format!("cn={},ou=groups,dc=example,dc=com", name)
}

// ============================================================================
// Directory fake
// ============================================================================

/// In-memory directory source with scripted failures.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    groups: Vec<SourceGroup>,
    members: HashMap<String, Vec<Identity>>,
    fail_list_groups: bool,
    fail_members_of: HashSet<String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group with the given member keys, in listing order.
    pub fn with_group(mut self, name: &str, members: &[&str]) -> Self {
        let handle = handle_for(name);
        self.groups
            .push(SourceGroup::new(name, SourceGroupHandle::new(handle.clone())));
        self.members
            .insert(handle, members.iter().map(|m| id(m)).collect());
        self
    }

    /// Make `list_groups` fail with `DirectoryError::Unavailable`.
    pub fn fail_list_groups(mut self) -> Self {
        self.fail_list_groups = true;
        self
    }

    /// Make `list_members` of one group fail with
    /// `DirectoryError::QueryFailed`.
    pub fn fail_members_of(mut self, name: &str) -> Self {
        self.fail_members_of.insert(handle_for(name));
        self
    }
}

impl DirectorySource for InMemoryDirectory {
    fn list_groups(
        &self,
        _filter: &str,
        _context: &RunContext,
    ) -> impl Future<Output = Result<Vec<SourceGroup>, DirectoryError>> + Send {
        async move {
            if self.fail_list_groups {
                return Err(DirectoryError::Unavailable {
                    message: "directory offline".to_string(),
                });
            }
            Ok(self.groups.clone())
        }
    }

    fn list_members(
        &self,
        group: &SourceGroupHandle,
        _context: &RunContext,
    ) -> impl Future<Output = Result<Vec<Identity>, DirectoryError>> + Send {
        async move {
            if self.fail_members_of.contains(group.as_str()) {
                return Err(DirectoryError::QueryFailed {
                    message: format!("search under '{}' failed", group),
                });
            }
            Ok(self.members.get(group.as_str()).cloned().unwrap_or_default())
        }
    }
}

// ============================================================================
// Platform fake
// ============================================================================

#[derive(Debug, Default)]
struct PlatformState {
    groups: HashMap<String, GroupRef>,
    hidden: HashSet<String>,
    members: HashMap<u64, Vec<GroupMember>>,
    accounts: HashMap<Identity, AccountId>,
    next_group_id: u64,
    next_account_id: u64,
}

/// Counts of mutating platform calls (attempts, not successes).
#[derive(Debug, Clone, Default)]
pub struct MutationCounters {
    inner: Arc<CounterInner>,
}

#[derive(Debug, Default)]
struct CounterInner {
    creates: AtomicUsize,
    adds: AtomicUsize,
    removes: AtomicUsize,
}

impl MutationCounters {
    pub fn creates(&self) -> usize {
        self.inner.creates.load(Ordering::SeqCst)
    }

    pub fn adds(&self) -> usize {
        self.inner.adds.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.inner.removes.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.creates() + self.adds() + self.removes()
    }
}

/// In-memory target platform with scripted failures and shared state.
///
/// Clones share the same state and counters, so keep one clone in the test
/// and move the other into the engine.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlatform {
    state: Arc<RwLock<PlatformState>>,
    pub counters: MutationCounters,
    fail_list_groups: bool,
    fail_member_listing: HashSet<String>,
    fail_add_for: HashSet<Identity>,
    fail_remove_for: HashSet<Identity>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a platform account for an identity key.
    pub async fn add_account(&self, key: &str) -> AccountId {
        let mut state = self.state.write().await;
        state.next_account_id += 1;
        let account = AccountId(state.next_account_id);
        state.accounts.insert(id(key), account);
        account
    }

    /// Register accounts for several identity keys.
    pub async fn add_accounts(&self, keys: &[&str]) {
        for key in keys {
            self.add_account(key).await;
        }
    }

    /// Seed an existing group with members (accounts are registered too).
    pub async fn seed_group(&self, name: &str, members: &[(&str, AccessLevel)]) -> GroupId {
        let group = {
            let mut state = self.state.write().await;
            state.next_group_id += 1;
            let group = GroupId(state.next_group_id);
            state.groups.insert(
                name.to_string(),
                GroupRef {
                    id: group,
                    name: name.to_string(),
                    description: String::new(),
                    visibility: Visibility::Private,
                },
            );
            state.members.insert(group.0, Vec::new());
            group
        };
        for (key, level) in members {
            self.add_account(key).await;
            let mut state = self.state.write().await;
            if let Some(list) = state.members.get_mut(&group.0) {
                list.push(GroupMember {
                    identity: id(key),
                    access_level: *level,
                });
            }
        }
        group
    }

    /// Seed a group that `get_group` resolves but `list_groups` omits,
    /// emulating a group created by a concurrent writer after the engine's
    /// initial listing.
    pub async fn seed_hidden_group(&self, name: &str, members: &[(&str, AccessLevel)]) -> GroupId {
        let group = self.seed_group(name, members).await;
        self.state.write().await.hidden.insert(name.to_string());
        group
    }

    /// Make the initial `list_groups` fail with `PlatformError::Unavailable`.
    pub fn fail_list_groups(mut self) -> Self {
        self.fail_list_groups = true;
        self
    }

    /// Make `list_group_members` of one group fail.
    pub fn fail_member_listing(mut self, name: &str) -> Self {
        self.fail_member_listing.insert(name.to_string());
        self
    }

    /// Make `add_member` fail for one identity with `PlatformError::Remote`.
    pub fn fail_add_for(mut self, key: &str) -> Self {
        self.fail_add_for.insert(id(key));
        self
    }

    /// Make `remove_member` fail for one identity.
    pub fn fail_remove_for(mut self, key: &str) -> Self {
        self.fail_remove_for.insert(id(key));
        self
    }

    /// Current member keys of a group, in listing order.
    pub async fn members_of(&self, name: &str) -> Vec<String> {
        let state = self.state.read().await;
        let Some(group) = state.groups.get(name) else {
            return Vec::new();
        };
        state
            .members
            .get(&group.id.0)
            .map(|members| {
                members
                    .iter()
                    .map(|m| m.identity.as_str().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Access level a member currently holds, if any.
    pub async fn level_of(&self, group_name: &str, key: &str) -> Option<AccessLevel> {
        let state = self.state.read().await;
        let group = state.groups.get(group_name)?;
        state
            .members
            .get(&group.id.0)?
            .iter()
            .find(|m| m.identity == id(key))
            .map(|m| m.access_level)
    }

    /// True if a group with this name exists.
    pub async fn has_group(&self, name: &str) -> bool {
        self.state.read().await.groups.contains_key(name)
    }

    async fn identity_for_account(&self, account: AccountId) -> Option<Identity> {
        let state = self.state.read().await;
        state
            .accounts
            .iter()
            .find(|(_, a)| **a == account)
            .map(|(identity, _)| identity.clone())
    }
}

impl TargetPlatform for InMemoryPlatform {
    fn list_groups(
        &self,
        _context: &RunContext,
    ) -> impl Future<Output = Result<Vec<GroupRef>, PlatformError>> + Send {
        async move {
            if self.fail_list_groups {
                return Err(PlatformError::Unavailable {
                    message: "platform offline".to_string(),
                });
            }
            let state = self.state.read().await;
            Ok(state
                .groups
                .values()
                .filter(|group| !state.hidden.contains(&group.name))
                .cloned()
                .collect())
        }
    }

    fn get_group(
        &self,
        name: &str,
        _context: &RunContext,
    ) -> impl Future<Output = Result<Option<GroupRef>, PlatformError>> + Send {
        async move { Ok(self.state.read().await.groups.get(name).cloned()) }
    }

    fn create_group(
        &self,
        group: &NewGroup,
        _context: &RunContext,
    ) -> impl Future<Output = Result<GroupRef, PlatformError>> + Send {
        async move {
            self.counters.inner.creates.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.write().await;
            if state.groups.contains_key(&group.name) {
                return Err(PlatformError::Conflict {
                    message: format!("group '{}' already exists", group.name),
                });
            }
            state.next_group_id += 1;
            let created = GroupRef {
                id: GroupId(state.next_group_id),
                name: group.name.clone(),
                description: group.description.clone(),
                visibility: group.visibility,
            };
            state.groups.insert(group.name.clone(), created.clone());
            state.members.insert(created.id.0, Vec::new());
            Ok(created)
        }
    }

    fn list_group_members(
        &self,
        group: GroupId,
        _context: &RunContext,
    ) -> impl Future<Output = Result<Vec<GroupMember>, PlatformError>> + Send {
        async move {
            let state = self.state.read().await;
            let name = state
                .groups
                .values()
                .find(|g| g.id == group)
                .map(|g| g.name.clone())
                .unwrap_or_default();
            if self.fail_member_listing.contains(&name) {
                return Err(PlatformError::Remote {
                    message: format!("listing members of '{}' failed", name),
                });
            }
            Ok(state.members.get(&group.0).cloned().unwrap_or_default())
        }
    }

    fn find_account_id(
        &self,
        identity: &Identity,
        _context: &RunContext,
    ) -> impl Future<Output = Result<Option<AccountId>, PlatformError>> + Send {
        async move { Ok(self.state.read().await.accounts.get(identity).copied()) }
    }

    fn add_member(
        &self,
        group: GroupId,
        account: AccountId,
        level: AccessLevel,
        _context: &RunContext,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send {
        async move {
            self.counters.inner.adds.fetch_add(1, Ordering::SeqCst);
            let identity = self.identity_for_account(account).await;
            if let Some(identity) = &identity {
                if self.fail_add_for.contains(identity) {
                    return Err(PlatformError::Remote {
                        message: format!("add of '{}' rejected", identity),
                    });
                }
            }
            let mut state = self.state.write().await;
            if let (Some(identity), Some(members)) = (identity, state.members.get_mut(&group.0)) {
                members.push(GroupMember {
                    identity,
                    access_level: level,
                });
            }
            Ok(())
        }
    }

    fn remove_member(
        &self,
        group: GroupId,
        account: AccountId,
        _context: &RunContext,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send {
        async move {
            self.counters.inner.removes.fetch_add(1, Ordering::SeqCst);
            let identity = self.identity_for_account(account).await;
            if let Some(identity) = &identity {
                if self.fail_remove_for.contains(identity) {
                    return Err(PlatformError::Remote {
                        message: format!("remove of '{}' rejected", identity),
                    });
                }
            }
            let mut state = self.state.write().await;
            if let (Some(identity), Some(members)) = (identity, state.members.get_mut(&group.0)) {
                members.retain(|m| m.identity != identity);
            }
            Ok(())
        }
    }
}
