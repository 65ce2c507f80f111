pub mod cancellation;
pub mod config;
pub mod constants;
pub mod cycle;
pub mod errors;
pub mod logging;
pub mod process;
pub mod scheduler;
pub mod services;
pub mod setup;

// Re-export commonly used types
pub use cancellation::Cancellation;
pub use config::Config;
pub use cycle::{CycleOutcome, CycleRunner, CycleState, MaintenanceCycle, Stage};
pub use errors::{CommandError, ConfigError, NotificationError, RunnerError, ServiceError};
pub use process::{CommandOutput, CommandRunner, ProcessRunner};
pub use scheduler::{CycleScheduler, TickOutcome};
pub use services::{
    LoopPolicy, Notifier, Priority, PushoverNotifier, ServiceAction, ServiceController,
};
