//! In-memory store backend built on DashMap.

pub mod identity;
pub mod session;

pub use identity::MemoryIdentityStore;
pub use session::MemorySessionStore;
