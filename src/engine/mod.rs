//! The reconciliation orchestrator.
//!
//! [`SyncEngine`] drives the per-group workflow: enumerate source groups,
//! resolve or create each matching target group, pull both member sets,
//! compute the delta, and apply it with per-member failure recovery. Groups
//! are independent units of work and are processed on a bounded worker
//! pool; within one group every step is strictly sequential.

mod config;
mod core;

pub use config::{DrainPolicy, EngineConfig, SyncEngineBuilder};
pub use core::{CancelHandle, SyncEngine};
