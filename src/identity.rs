//! Identity value objects for membership comparison.
//!
//! Both sides of a sync speak different identity dialects: the directory
//! yields account-name attributes (e.g. `sAMAccountName` values), the target
//! platform yields login names. [`Identity`] folds both through one
//! normalization rule so membership comparison is plain key equality.

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// A normalized principal key, comparable across the directory source and
/// the target platform.
///
/// Normalization is applied at construction: surrounding whitespace is
/// trimmed and the key is ASCII-lowercased. Matching is therefore
/// **case-insensitive** by policy; two identities are equal iff their
/// normalized keys are equal. The policy is fixed here and nowhere else, so
/// adapters never need to agree on casing.
///
/// ## Examples
///
/// ```rust
/// use groupsync::Identity;
///
/// let a = Identity::new("JDoe")?;
/// let b = Identity::new("  jdoe ")?;
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "jdoe");
/// # Ok::<(), groupsync::ValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    /// Create a new identity, normalizing the raw key.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIdentity`] if the key is empty after
    /// trimming.
    pub fn new(raw: impl AsRef<str>) -> ValidationResult<Self> {
        let normalized = raw.as_ref().trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::EmptyIdentity);
        }
        Ok(Self(normalized))
    }

    /// Create an identity from a key that is already normalized.
    ///
    /// The caller must guarantee the value is trimmed, lowercased, and
    /// non-empty; intended for trusted inputs such as test fixtures.
    #[allow(dead_code)]
    pub(crate) fn new_unchecked(key: String) -> Self {
        Self(key)
    }

    /// The normalized key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identity, returning the normalized key.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Identity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<String> for Identity {
    type Error = ValidationError;

    fn try_from(value: String) -> ValidationResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Identity {
    type Error = ValidationError;

    fn try_from(value: &str) -> ValidationResult<Self> {
        Self::new(value)
    }
}

/// An unordered collection of [`Identity`] values, unique by key, that
/// remembers first-seen listing order.
///
/// Listing order is what makes delta output deterministic and reproducible
/// across retries: `to_add` follows the desired set's order, `to_remove`
/// follows the current set's order. A `MemberSet` is built fresh per group
/// per run and never mutated after construction; each membership state is a
/// new set.
#[derive(Debug, Clone, Default)]
pub struct MemberSet {
    members: Vec<Identity>,
    index: HashSet<Identity>,
}

impl MemberSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a listing, keeping the first occurrence of each key.
    pub fn from_members(members: impl IntoIterator<Item = Identity>) -> Self {
        let mut set = Self::new();
        for identity in members {
            set.insert(identity);
        }
        set
    }

    /// Build a set from a listing, dropping every identity in `excluded`.
    ///
    /// This is how protected accounts are kept out of delta consideration:
    /// the exclusion happens while the state is modeled, so the delta
    /// calculator stays policy-free.
    pub fn from_members_excluding(
        members: impl IntoIterator<Item = Identity>,
        excluded: &HashSet<Identity>,
    ) -> Self {
        Self::from_members(
            members
                .into_iter()
                .filter(|identity| !excluded.contains(identity)),
        )
    }

    fn insert(&mut self, identity: Identity) -> bool {
        if self.index.contains(&identity) {
            return false;
        }
        self.index.insert(identity.clone());
        self.members.push(identity);
        true
    }

    /// Membership probe by normalized key.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.index.contains(identity)
    }

    /// Iterate in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.members.iter()
    }

    /// Number of distinct identities.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if the set holds no identities.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<Identity> for MemberSet {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        Self::from_members(iter)
    }
}

impl<'a> IntoIterator for &'a MemberSet {
    type Item = &'a Identity;
    type IntoIter = std::slice::Iter<'a, Identity>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
