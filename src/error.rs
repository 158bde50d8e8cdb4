//! Error types for group synchronization operations.
//!
//! Adapter-facing errors ([`DirectoryError`], [`PlatformError`]) describe
//! failures of the external collaborators; [`SyncError`] is the engine-level
//! taxonomy, and [`ErrorKind`] is the serializable classification recorded in
//! per-group outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result alias for engine-level operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result alias for identity validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised by a [`DirectorySource`](crate::source::DirectorySource)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The directory server cannot be reached at all (connection refused,
    /// bind failure, timeout after the adapter's own retries).
    #[error("directory unavailable: {message}")]
    Unavailable { message: String },

    /// The directory answered but the query itself failed (bad filter,
    /// missing base, server-side error).
    #[error("directory query failed: {message}")]
    QueryFailed { message: String },
}

impl DirectoryError {
    /// Classify this error for outcome recording.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectoryError::Unavailable { .. } => ErrorKind::DirectoryUnavailable,
            DirectoryError::QueryFailed { .. } => ErrorKind::DirectoryQueryFailed,
        }
    }
}

/// Errors raised by a [`TargetPlatform`](crate::platform::TargetPlatform)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The platform cannot be reached at all.
    #[error("platform unavailable: {message}")]
    Unavailable { message: String },

    /// The platform rejected a create because the resource already exists.
    ///
    /// During group resolution this is success-equivalent: another writer
    /// won the race and the engine re-resolves the group instead of failing.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Any other remote failure (HTTP 4xx/5xx, malformed response) after the
    /// adapter has exhausted its own retry policy.
    #[error("platform error: {message}")]
    Remote { message: String },
}

impl PlatformError {
    /// Classify this error for outcome recording.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlatformError::Unavailable { .. } => ErrorKind::PlatformUnavailable,
            PlatformError::Conflict { .. } => ErrorKind::PlatformConflict,
            PlatformError::Remote { .. } => ErrorKind::PlatformError,
        }
    }

    /// True if this is a [`PlatformError::Conflict`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, PlatformError::Conflict { .. })
    }
}

/// Validation errors for identity construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The identity key is empty after normalization.
    #[error("identity key is empty")]
    EmptyIdentity,
}

/// Engine-level error type.
///
/// Only run-fatal conditions surface as `SyncError` out of
/// [`SyncEngine::reconcile`](crate::engine::SyncEngine::reconcile); everything
/// group- or member-scoped is recovered locally and recorded in the
/// [`RunReport`](crate::report::RunReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Directory source failure.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Target platform failure.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Identity validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No access-level rule matched the group name and no explicit level was
    /// supplied.
    #[error("unsupported role in group name: {group_name}")]
    UnsupportedRole { group_name: String },

    /// The engine configuration is invalid.
    #[error("invalid engine configuration: {message}")]
    InvalidConfig { message: String },
}

impl SyncError {
    /// Classify this error for outcome recording.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Directory(e) => e.kind(),
            SyncError::Platform(e) => e.kind(),
            SyncError::Validation(_) => ErrorKind::PlatformError,
            SyncError::UnsupportedRole { .. } => ErrorKind::UnsupportedRole,
            SyncError::InvalidConfig { .. } => ErrorKind::PlatformError,
        }
    }
}

/// Failure classification recorded in group outcomes.
///
/// `FullDrainDetected` is advisory and never produced as an error by the
/// engine itself; it exists so renderers share one vocabulary with the
/// `full_drain` outcome flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DirectoryUnavailable,
    DirectoryQueryFailed,
    PlatformUnavailable,
    PlatformConflict,
    PlatformError,
    UnsupportedRole,
    AccountNotFound,
    FullDrainDetected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::DirectoryUnavailable => "DirectoryUnavailable",
            ErrorKind::DirectoryQueryFailed => "DirectoryQueryFailed",
            ErrorKind::PlatformUnavailable => "PlatformUnavailable",
            ErrorKind::PlatformConflict => "PlatformConflict",
            ErrorKind::PlatformError => "PlatformError",
            ErrorKind::UnsupportedRole => "UnsupportedRole",
            ErrorKind::AccountNotFound => "AccountNotFound",
            ErrorKind::FullDrainDetected => "FullDrainDetected",
        };
        write!(f, "{}", name)
    }
}
