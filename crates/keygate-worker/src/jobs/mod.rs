//! Scheduled job implementations.

pub mod sweep;

pub use sweep::SweepJob;
