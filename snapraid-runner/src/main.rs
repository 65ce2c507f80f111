// File: snapraid-runner/src/main.rs
use anyhow::Result;
use snapraid_runner::constants::paths;
use snapraid_runner::{
    logging, setup, Cancellation, CommandRunner, Config, CycleOutcome, CycleScheduler,
    MaintenanceCycle, Notifier, ProcessRunner, PushoverNotifier, RunnerError, ServiceController,
    TickOutcome,
};
use std::path::Path;
use std::sync::Arc;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{error, info, warn};

/// SIGINT, SIGTERM and SIGHUP all request shutdown
struct TerminationSignals {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
}

impl TerminationSignals {
    fn new() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.hangup.recv() => "SIGHUP",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    info!("Starting Snapraid Runner");

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            let err = RunnerError::from(e);
            error!("{}", err);
            return Err(err.into());
        }
    };
    info!("Configuration loaded: {}", config.redacted_summary());

    setup::ensure_config_symlink(
        Path::new(paths::SNAPRAID_CONFIG_SOURCE),
        Path::new(paths::SNAPRAID_CONFIG_LINK),
    )
    .await;

    let cancellation = Cancellation::new();

    let pushover = PushoverNotifier::new(
        config.pushover_api_url.clone(),
        config.pushover_token.clone(),
        config.pushover_user.clone(),
    );
    info!("Notifications will be sent to {}", pushover.api_url());
    let notifier: Arc<dyn Notifier> = Arc::new(pushover);

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new());

    let controller = Arc::new(ServiceController::new(
        config.container_runtime.clone(),
        runner.clone(),
        notifier.clone(),
    ));

    let cycle = Arc::new(MaintenanceCycle::new(
        config.clone(),
        runner,
        controller,
        notifier,
        cancellation.clone(),
    ));

    let scheduler = Arc::new(CycleScheduler::new(cycle, cancellation));

    let mut signals = TerminationSignals::new()?;
    let listener = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            let received = signals.recv().await;
            scheduler.shutdown(received).await;
            signals
        })
    };

    if config.run_once {
        match scheduler.run_once().await {
            TickOutcome::Ran(CycleOutcome::Success) => info!("Single run completed successfully"),
            TickOutcome::Ran(CycleOutcome::Failure { stage, message }) => {
                warn!("Single run failed while {}: {}", stage, message)
            }
            TickOutcome::Skipped => warn!("Single run skipped, a cycle was already in flight"),
        }
        listener.abort();
        return Ok(());
    }

    scheduler
        .start(&config.cron_schedule, config.timezone)
        .await?;

    let mut signals = listener.await?;

    if scheduler.is_running() {
        info!("Waiting for the in-flight cycle to restore services before exiting");
        tokio::select! {
            _ = scheduler.wait_idle() => info!("In-flight cycle settled"),
            received = signals.recv() => {
                warn!("Received {} again, exiting without waiting", received)
            }
        }
    }

    info!("Snapraid Runner stopped");
    Ok(())
}
