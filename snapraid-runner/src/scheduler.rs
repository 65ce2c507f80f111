//! Cron-based scheduling of maintenance cycles
//!
//! # Features
//!
//! - **Cron-based scheduling**: accepts 5-field (`min hour day month dow`) or
//!   6-field (`sec min hour day month dow`) expressions
//! - **Timezone-aware**: schedules fire in the configured IANA timezone
//! - **Single flight**: a tick that arrives while a cycle is running is
//!   dropped, never queued
//! - **Signal shutdown**: a termination signal cancels in-flight work and
//!   stops the timer without waiting for the cycle to notice
//!
//! # Configuration
//!
//! ```text
//! CRON_SCHEDULE="0 3 * * *"       # Daily at 3 AM
//! TIMEZONE="America/Mexico_City"
//! ```

use crate::cancellation::Cancellation;
use crate::cycle::{CycleOutcome, CycleRunner};
use crate::errors::RunnerError;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Ran(CycleOutcome),
    Skipped,
}

/// Clears the in-flight flag when dropped, so every settle path releases it
struct FlightGuard<'a> {
    in_flight: &'a watch::Sender<bool>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.send_replace(false);
    }
}

pub struct CycleScheduler {
    cycle: Arc<dyn CycleRunner>,
    cancellation: Cancellation,
    in_flight: watch::Sender<bool>,
    scheduler: Mutex<Option<JobScheduler>>,
}

impl CycleScheduler {
    pub fn new(cycle: Arc<dyn CycleRunner>, cancellation: Cancellation) -> Self {
        let (in_flight, _) = watch::channel(false);
        Self {
            cycle,
            cancellation,
            in_flight,
            scheduler: Mutex::new(None),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        *self.in_flight.borrow()
    }

    /// Run a cycle unless one is already in flight
    pub async fn tick(&self) -> TickOutcome {
        let acquired = self.in_flight.send_if_modified(|busy| {
            if *busy {
                false
            } else {
                *busy = true;
                true
            }
        });

        if !acquired {
            debug!("Maintenance cycle already running, skipping tick");
            return TickOutcome::Skipped;
        }

        let _guard = FlightGuard {
            in_flight: &self.in_flight,
        };
        info!("Running scheduled task");
        TickOutcome::Ran(self.cycle.run_cycle().await)
    }

    /// Run exactly one cycle, bypassing the timer
    pub async fn run_once(&self) -> TickOutcome {
        info!("Running a single maintenance cycle");
        self.tick().await
    }

    #[instrument(skip(self))]
    pub async fn start(
        self: &Arc<Self>,
        schedule: &str,
        timezone: Tz,
    ) -> Result<(), RunnerError> {
        let schedule = normalize_cron(schedule)?;
        info!(
            "Starting maintenance scheduler with schedule '{}' in {}",
            schedule, timezone
        );

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| RunnerError::Scheduler(format!("Failed to create JobScheduler: {}", e)))?;

        let this = Arc::clone(self);
        let job = Job::new_async_tz(schedule.as_str(), timezone, move |_uuid, _scheduler| {
            let this = this.clone();
            Box::pin(async move {
                if let TickOutcome::Skipped = this.tick().await {
                    debug!("Tick dropped while a cycle is in flight");
                }
            })
        })
        .map_err(|e| {
            RunnerError::Scheduler(format!("Failed to create job for '{}': {}", schedule, e))
        })?;

        scheduler
            .add(job)
            .await
            .map_err(|e| RunnerError::Scheduler(format!("Failed to add job to scheduler: {}", e)))?;
        scheduler
            .start()
            .await
            .map_err(|e| RunnerError::Scheduler(format!("Failed to start scheduler: {}", e)))?;

        *self.scheduler.lock().await = Some(scheduler);
        info!("✓ Maintenance scheduler started");
        Ok(())
    }

    /// Stop the timer. In-flight work is not awaited.
    pub async fn stop(&self) {
        let scheduler = self.scheduler.lock().await.take();
        if let Some(mut scheduler) = scheduler {
            if let Err(e) = scheduler.shutdown().await {
                warn!("Failed to shut down scheduler cleanly: {}", e);
            } else {
                info!("Maintenance scheduler stopped");
            }
        }
    }

    /// Entry point for process signals: cancel, then stop the timer
    pub async fn shutdown(&self, signal: &str) {
        warn!("Received {}, shutting down", signal);
        self.cancellation
            .cancel(format!("Parent process was stopped {}", signal));
        self.stop().await;
    }

    /// Resolves once no cycle is in flight
    pub async fn wait_idle(&self) {
        let mut rx = self.in_flight.subscribe();
        // Sender lives in self, so the channel cannot close while borrowed
        let _ = rx.wait_for(|busy| !*busy).await;
    }
}

/// Normalise a cron expression to the 6-field form the job scheduler expects
pub fn normalize_cron(schedule: &str) -> Result<String, RunnerError> {
    let parts: Vec<&str> = schedule.split_whitespace().collect();
    match parts.len() {
        5 => Ok(format!("0 {}", parts.join(" "))),
        6 => Ok(parts.join(" ")),
        n => Err(RunnerError::Scheduler(format!(
            "Cron schedule must have 5 or 6 fields, got {}: '{}'",
            n, schedule
        ))),
    }
}
