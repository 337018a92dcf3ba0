//! Expired session record removal.

use std::sync::Arc;

use tracing::{debug, info};

use keygate_core::result::AppResult;
use keygate_core::traits::Clock;
use keygate_store::SessionStore;

/// Removes session records past their expiry.
///
/// Lookups already treat expired records as absent and delete them
/// lazily; the sweep reclaims records nobody looks up again.
#[derive(Debug, Clone)]
pub struct SweepJob {
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl SweepJob {
    /// Creates the job over a session store.
    pub fn new(sessions: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }

    /// Runs one sweep pass. Returns how many records were removed.
    pub async fn run(&self) -> AppResult<u64> {
        let removed = self.sessions.remove_expired(self.clock.now()).await?;
        if removed > 0 {
            info!(removed, "Expired session sweep completed");
        } else {
            debug!("Expired session sweep found nothing to remove");
        }
        Ok(removed)
    }
}
