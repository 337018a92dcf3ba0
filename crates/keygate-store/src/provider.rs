//! Store provider that dispatches to the configured backend.

use std::sync::Arc;

use tracing::info;

use keygate_core::config::store::StoreConfig;
use keygate_core::error::AppError;
use keygate_core::result::AppResult;

use crate::memory::{MemoryIdentityStore, MemorySessionStore};
use crate::postgres::{DatabasePool, PostgresIdentityStore, PostgresSessionStore};
use crate::traits::{IdentityStore, SessionStore};

/// The identity and session stores behind one backend selection.
///
/// Both stores always come from the same backend; mixing a durable
/// identity store with a volatile session store would break revocation
/// across restarts.
#[derive(Debug, Clone)]
pub struct Stores {
    identities: Arc<dyn IdentityStore>,
    sessions: Arc<dyn SessionStore>,
}

impl Stores {
    /// Create stores from configuration.
    ///
    /// The postgres backend connects a pool and brings the schema up to
    /// date before returning.
    pub async fn new(config: &StoreConfig) -> AppResult<Self> {
        match config.backend.as_str() {
            "postgres" => {
                info!("Initializing PostgreSQL store backend");
                let db = DatabasePool::connect(&config.postgres).await?;
                crate::postgres::migration::run_migrations(db.pool()).await?;
                Ok(Self {
                    identities: Arc::new(PostgresIdentityStore::new(db.pool().clone())),
                    sessions: Arc::new(PostgresSessionStore::new(db.pool().clone())),
                })
            }
            "memory" => {
                info!("Initializing in-memory store backend");
                Ok(Self::in_memory())
            }
            other => Err(AppError::configuration(format!(
                "Unknown store backend: '{other}'. Supported: memory, postgres"
            ))),
        }
    }

    /// Create in-memory stores directly, bypassing configuration.
    pub fn in_memory() -> Self {
        Self {
            identities: Arc::new(MemoryIdentityStore::new()),
            sessions: Arc::new(MemorySessionStore::new()),
        }
    }

    /// Create stores from existing implementations (for testing).
    pub fn from_parts(
        identities: Arc<dyn IdentityStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            identities,
            sessions,
        }
    }

    /// Handle to the identity store.
    pub fn identities(&self) -> Arc<dyn IdentityStore> {
        Arc::clone(&self.identities)
    }

    /// Handle to the session store.
    pub fn sessions(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.sessions)
    }
}
