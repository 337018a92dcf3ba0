//! # keygate-worker
//!
//! Scheduled maintenance for Keygate: an interval-driven sweep that
//! removes expired session records, so storage does not accumulate
//! records nobody will redeem.

pub mod jobs;
pub mod scheduler;

pub use jobs::SweepJob;
pub use scheduler::MaintenanceScheduler;
