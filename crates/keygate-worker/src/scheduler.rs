//! Interval scheduler for maintenance jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use keygate_core::error::AppError;
use keygate_core::result::AppResult;

use crate::jobs::SweepJob;

/// Drives periodic maintenance off a shared scheduler.
pub struct MaintenanceScheduler {
    scheduler: JobScheduler,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler").finish()
    }
}

impl MaintenanceScheduler {
    /// Creates a scheduler with no jobs registered.
    pub async fn new() -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;
        Ok(Self { scheduler })
    }

    /// Registers the expired-session sweep at a fixed interval.
    pub async fn register_sweep(&self, job: SweepJob, interval: Duration) -> AppResult<()> {
        let job = Arc::new(job);
        let scheduled = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                if let Err(e) = job.run().await {
                    error!(error = %e, "Session sweep failed");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create sweep schedule: {e}")))?;

        self.scheduler
            .add(scheduled)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {e}")))?;

        info!(
            interval_seconds = interval.as_secs(),
            "Registered expired-session sweep"
        );
        Ok(())
    }

    /// Starts running registered jobs.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;
        info!("Maintenance scheduler started");
        Ok(())
    }

    /// Stops the scheduler and its jobs.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shut down scheduler: {e}")))?;
        info!("Maintenance scheduler shut down");
        Ok(())
    }
}
