//! PostgreSQL store backend.

pub mod connection;
pub mod identity;
pub mod migration;
pub mod session;

pub use connection::DatabasePool;
pub use identity::PostgresIdentityStore;
pub use session::PostgresSessionStore;
