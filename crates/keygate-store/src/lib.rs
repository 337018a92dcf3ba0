//! # keygate-store
//!
//! Store backends for identities and session records. Two
//! implementations share the same traits: an in-memory backend
//! (DashMap) used by tests and small single-node deployments, and a
//! PostgreSQL backend for durable multi-node operation. The backend is
//! selected by configuration at construction time.

pub mod memory;
pub mod postgres;
pub mod provider;
pub mod traits;

pub use provider::Stores;
pub use traits::{IdentityStore, SessionStore};
