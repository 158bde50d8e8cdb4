//! Group membership reconciliation engine.
//!
//! Reconciles group membership held in an authoritative directory source
//! (LDAP or any enumerable membership provider) against a GitLab-like
//! target platform, so that after a run every group's member set on the
//! target matches the source's desired set, with minimal mutating calls
//! and one auditable outcome per group.
//!
//! # Core Components
//!
//! - [`SyncEngine`] - Orchestrator driving the per-group reconcile workflow
//! - [`DirectorySource`] / [`TargetPlatform`] - Capability traits the
//!   engine consumes; implement these over your directory and REST client
//! - [`compute_delta`] - Pure add/remove delta between two member sets
//! - [`RunReport`] - Per-group outcomes handed back to the caller
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use groupsync::{SyncEngineBuilder, Visibility};
//! # use groupsync::{DirectorySource, TargetPlatform};
//!
//! # async fn example<S, P>(ldap: S, gitlab: P) -> Result<(), Box<dyn std::error::Error>>
//! # where
//! #     S: DirectorySource + Send + Sync + 'static,
//! #     P: TargetPlatform + Send + Sync + 'static,
//! # {
//! let engine = SyncEngineBuilder::new(ldap, gitlab)
//!     .group_filter("(objectClass=group)")
//!     .default_visibility(Visibility::Private)
//!     .build()?;
//!
//! let report = engine.reconcile().await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod context;
pub mod delta;
pub mod engine;
pub mod error;
pub mod identity;
pub mod platform;
pub mod report;
pub mod source;

// Re-export commonly used types for convenience
pub use access::{AccessLevel, AccessRules, resolve_access_level};
pub use context::RunContext;
pub use delta::{Delta, compute_delta};
pub use engine::{CancelHandle, DrainPolicy, EngineConfig, SyncEngine, SyncEngineBuilder};
pub use error::{
    DirectoryError, ErrorKind, PlatformError, SyncError, SyncResult, ValidationError,
    ValidationResult,
};
pub use identity::{Identity, MemberSet};
pub use platform::{
    AccountId, GroupId, GroupMember, GroupRef, NewGroup, TargetPlatform, Visibility,
};
pub use report::{GroupOutcome, RunReport, Stage, SyncFailure};
pub use source::{DirectorySource, SourceGroup, SourceGroupHandle};
