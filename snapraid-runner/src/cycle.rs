//! Maintenance cycle orchestration
//!
//! A cycle stops the dependent services, runs `snapraid sync` followed by
//! `snapraid scrub -p <percentage>`, and then restarts every service. The
//! restart phase runs on every path, whatever failed before it, and nothing
//! a cycle does is ever returned to the caller as an error.
//!
//! ```text
//! Idle -> StoppingServices -> Syncing -> Notifying -> Scrubbing -> Notifying
//!            |                  |                       |
//!            +------------------+-----------------------+--> RestartingServices -> Completed
//! ```

use crate::cancellation::Cancellation;
use crate::config::Config;
use crate::errors::{CommandError, ServiceError};
use crate::process::{CommandOutput, CommandRunner};
use crate::services::{Notifier, Priority, ServiceController};
use chrono::Utc;
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Stopping,
    Syncing,
    Scrubbing,
    Starting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Stopping => "stopping",
            Stage::Syncing => "syncing",
            Stage::Scrubbing => "scrubbing",
            Stage::Starting => "starting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CycleOutcome {
    Success,
    Failure { stage: Stage, message: String },
}

impl CycleOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Success)
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            CycleOutcome::Success => None,
            CycleOutcome::Failure { stage, .. } => Some(*stage),
        }
    }
}

/// Which consistency operation a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    Sync,
    Scrub,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CycleState {
    Idle,
    StoppingServices,
    Syncing,
    Scrubbing,
    Notifying(Operation),
    RestartingServices,
    Completed(CycleOutcome),
}

/// Seam the scheduler drives; implemented by [`MaintenanceCycle`]
pub trait CycleRunner: Send + Sync {
    fn run_cycle(&self) -> BoxFuture<'_, CycleOutcome>;
}

pub struct MaintenanceCycle {
    config: Arc<Config>,
    runner: Arc<dyn CommandRunner>,
    controller: Arc<ServiceController>,
    notifier: Arc<dyn Notifier>,
    cancellation: Cancellation,
    state: RwLock<CycleState>,
}

impl MaintenanceCycle {
    pub fn new(
        config: Arc<Config>,
        runner: Arc<dyn CommandRunner>,
        controller: Arc<ServiceController>,
        notifier: Arc<dyn Notifier>,
        cancellation: Cancellation,
    ) -> Self {
        Self {
            config,
            runner,
            controller,
            notifier,
            cancellation,
            state: RwLock::new(CycleState::Idle),
        }
    }

    pub async fn state(&self) -> CycleState {
        self.state.read().await.clone()
    }

    async fn transition(&self, next: CycleState) {
        let mut state = self.state.write().await;
        *state = next;
    }

    /// Run one complete cycle. Never fails; the outcome is logged, notified
    /// and returned for inspection.
    pub async fn run(&self) -> CycleOutcome {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", cycle_id = %cycle_id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> CycleOutcome {
        let started_at = Utc::now();
        info!(
            "Starting maintenance cycle for {} services",
            self.config.containers.len()
        );

        let outcome = self.run_stages().await;

        // Recovery runs on every path
        self.transition(CycleState::RestartingServices).await;
        if let Err(e) = self
            .controller
            .start_all(&self.config.containers, &self.cancellation)
            .await
        {
            error!(stage = %Stage::Starting, "Failed to recover after cycle: {}", e);
        }

        let elapsed = Utc::now().signed_duration_since(started_at);
        match &outcome {
            CycleOutcome::Success => info!(
                "Maintenance cycle completed successfully in {}m {}s",
                elapsed.num_minutes(),
                elapsed.num_seconds() % 60
            ),
            CycleOutcome::Failure { stage, message } => error!(
                stage = %stage,
                "Maintenance cycle failed after {}m {}s: {}",
                elapsed.num_minutes(),
                elapsed.num_seconds() % 60,
                message
            ),
        }

        self.transition(CycleState::Completed(outcome.clone())).await;
        outcome
    }

    async fn run_stages(&self) -> CycleOutcome {
        self.transition(CycleState::StoppingServices).await;
        if let Err(e) = self
            .controller
            .stop_all(&self.config.containers, &self.cancellation)
            .await
        {
            return self.stop_failed(e).await;
        }

        self.transition(CycleState::Syncing).await;
        let sync = match self.consistency_operation(Operation::Sync).await {
            Ok(output) => output,
            Err(e) => return self.operation_failed(Stage::Syncing, e).await,
        };

        self.transition(CycleState::Notifying(Operation::Sync)).await;
        self.notify_success(Operation::Sync, &sync).await;

        self.transition(CycleState::Scrubbing).await;
        let scrub = match self.consistency_operation(Operation::Scrub).await {
            Ok(output) => output,
            Err(e) => return self.operation_failed(Stage::Scrubbing, e).await,
        };

        self.transition(CycleState::Notifying(Operation::Scrub)).await;
        self.notify_success(Operation::Scrub, &scrub).await;

        CycleOutcome::Success
    }

    async fn consistency_operation(
        &self,
        operation: Operation,
    ) -> Result<CommandOutput, CommandError> {
        let args = match operation {
            Operation::Sync => vec!["sync".to_string()],
            Operation::Scrub => vec![
                "scrub".to_string(),
                "-p".to_string(),
                self.config.scrub_percentage.to_string(),
            ],
        };

        info!("Running {} {}", self.config.snapraid_bin, args.join(" "));
        self.runner
            .run(&self.config.snapraid_bin, &args, Some(&self.cancellation))
            .await
    }

    async fn stop_failed(&self, err: ServiceError) -> CycleOutcome {
        // The controller already notified per-service failures
        if let ServiceError::Aborted { reason } = &err {
            warn!("Stopping services aborted: {}", reason);
            let message = format!("Maintenance cycle aborted before sync: {}", reason);
            self.notifier.notify(&message, Priority::High).await;
        }

        CycleOutcome::Failure {
            stage: Stage::Stopping,
            message: err.to_string(),
        }
    }

    async fn operation_failed(&self, stage: Stage, err: CommandError) -> CycleOutcome {
        error!(
            stage = %stage,
            "Error while {}: {} {} {}",
            stage,
            err,
            err.stdout().trim(),
            err.stderr().trim()
        );

        let mut message = format!("Error while {}\nMessage: {}", stage, err);
        if !err.stdout().trim().is_empty() {
            message.push_str(&format!("\nStdout: {}", err.stdout().trim()));
        }
        if !err.stderr().trim().is_empty() {
            message.push_str(&format!("\nStderr: {}", err.stderr().trim()));
        }
        self.notifier.notify(&message, Priority::High).await;

        CycleOutcome::Failure {
            stage,
            message: err.to_string(),
        }
    }

    async fn notify_success(&self, operation: Operation, output: &CommandOutput) {
        let label = match operation {
            Operation::Sync => "Sync",
            Operation::Scrub => "Scrub",
        };
        let message = format!(
            "{} completed successfully\n{}",
            label,
            output.stdout.trim()
        );
        self.notifier.notify(&message, Priority::Normal).await;
    }
}

impl CycleRunner for MaintenanceCycle {
    fn run_cycle(&self) -> BoxFuture<'_, CycleOutcome> {
        Box::pin(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_helpers() {
        assert!(CycleOutcome::Success.is_success());
        assert_eq!(CycleOutcome::Success.failed_stage(), None);

        let failure = CycleOutcome::Failure {
            stage: Stage::Scrubbing,
            message: "'snapraid-scrub' exited with 1".to_string(),
        };
        assert!(!failure.is_success());
        assert_eq!(failure.failed_stage(), Some(Stage::Scrubbing));
    }

    #[test]
    fn test_outcome_serializes_stage_lowercase() {
        let failure = CycleOutcome::Failure {
            stage: Stage::Syncing,
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["Failure"]["stage"], "syncing");
    }
}
