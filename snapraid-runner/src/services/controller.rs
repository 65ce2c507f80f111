// File: snapraid-runner/src/services/controller.rs
use crate::cancellation::Cancellation;
use crate::errors::ServiceError;
use crate::process::CommandRunner;
use crate::services::notifier::{Notifier, Priority};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a loop over the service list reacts to cancellation and failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPolicy {
    /// Check cancellation before every service and stop at the first error
    FailFast,
    /// Ignore cancellation and attempt every service
    BestEffort,
}

impl LoopPolicy {
    #[inline]
    pub fn honors_cancellation(&self) -> bool {
        matches!(self, LoopPolicy::FailFast)
    }
}

/// Issues `<runtime> start|stop <service>` for the configured services,
/// strictly one at a time and in list order.
pub struct ServiceController {
    runtime: String,
    runner: Arc<dyn CommandRunner>,
    notifier: Arc<dyn Notifier>,
}

impl ServiceController {
    pub fn new(
        runtime: String,
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            runtime,
            runner,
            notifier,
        }
    }

    pub async fn stop_all(
        &self,
        services: &[String],
        cancel: &Cancellation,
    ) -> Result<(), ServiceError> {
        self.apply(services, ServiceAction::Stop, LoopPolicy::FailFast, cancel)
            .await
    }

    pub async fn start_all(
        &self,
        services: &[String],
        cancel: &Cancellation,
    ) -> Result<(), ServiceError> {
        self.apply(services, ServiceAction::Start, LoopPolicy::BestEffort, cancel)
            .await
    }

    #[instrument(skip(self, services, cancel), fields(count = services.len()))]
    pub async fn apply(
        &self,
        services: &[String],
        action: ServiceAction,
        policy: LoopPolicy,
        cancel: &Cancellation,
    ) -> Result<(), ServiceError> {
        let mut failed = Vec::new();

        for service in services {
            if policy.honors_cancellation() {
                if let Some(reason) = cancel.reason() {
                    warn!(
                        "Cancellation requested, skipping {} for remaining services: {}",
                        action, reason
                    );
                    return Err(ServiceError::Aborted { reason });
                }
            }

            match self.apply_one(service, action, policy, cancel).await {
                Ok(()) => {}
                Err(e) => {
                    error!("{}", e);
                    self.notifier.notify(&failure_message(&e), Priority::High).await;

                    match policy {
                        LoopPolicy::FailFast => return Err(e),
                        LoopPolicy::BestEffort => failed.push(service.clone()),
                    }
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Incomplete {
                action: action.to_string(),
                failed,
            })
        }
    }

    async fn apply_one(
        &self,
        service: &str,
        action: ServiceAction,
        policy: LoopPolicy,
        cancel: &Cancellation,
    ) -> Result<(), ServiceError> {
        let args = [action.as_str().to_string(), service.to_string()];
        let cancel = policy.honors_cancellation().then_some(cancel);

        match self.runner.run(&self.runtime, &args, cancel).await {
            Ok(output) => {
                info!(
                    "Service {} {} successfully: {}",
                    service,
                    past_tense(action),
                    output.stdout.trim()
                );
                Ok(())
            }
            Err(source) => Err(ServiceError::Action {
                service: service.to_string(),
                action: action.to_string(),
                source,
            }),
        }
    }
}

fn past_tense(action: ServiceAction) -> &'static str {
    match action {
        ServiceAction::Start => "started",
        ServiceAction::Stop => "stopped",
    }
}

fn failure_message(err: &ServiceError) -> String {
    let mut message = format!("Message: {}", err);
    if let Some(source) = err.command_error() {
        if !source.stdout().trim().is_empty() {
            message.push_str(&format!("\nStdout: {}", source.stdout().trim()));
        }
        if !source.stderr().trim().is_empty() {
            message.push_str(&format!("\nStderr: {}", source.stderr().trim()));
        }
    }
    message
}
