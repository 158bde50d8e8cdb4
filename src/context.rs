//! Run context threaded through adapter calls.

use uuid::Uuid;

/// Context for one reconciliation run.
///
/// Carries the run identifier so adapter implementations can correlate
/// their own logs and audit records with the engine's
/// [`RunReport`](crate::report::RunReport). Cheap to clone; shared
/// read-only across all concurrent group workers.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique identifier for this run.
    pub run_id: String,
}

impl RunContext {
    /// Create a context with a specific run ID.
    pub fn new(run_id: String) -> Self {
        Self { run_id }
    }

    /// Create a context with a generated run ID.
    pub fn with_generated_id() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::with_generated_id()
    }
}
