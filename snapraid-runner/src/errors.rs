//! Custom error types for the snapraid runner
//!
//! Provides structured error handling with context for the different stages
//! of a maintenance cycle. Stage errors stop at the cycle boundary; nothing
//! here is meant to crash the daemon except `ConfigError` at startup.

use std::fmt;

/// Main error type for the snapraid runner
#[derive(Debug)]
pub enum RunnerError {
    /// Configuration-related errors
    Config(ConfigError),

    /// Scheduler setup errors
    Scheduler(String),
}

/// External command error variants
#[derive(Debug, Clone)]
pub enum CommandError {
    /// Process exited with a non-zero code (or was killed by a signal)
    Failed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Cancellation was observed when the process exited
    Aborted {
        command: String,
        reason: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Process could not be spawned or waited on
    Launch { command: String, reason: String },
}

/// Service lifecycle error variants
#[derive(Debug, Clone)]
pub enum ServiceError {
    /// Lifecycle command failed for one service
    Action {
        service: String,
        action: String,
        source: CommandError,
    },

    /// Loop stopped because cancellation was triggered
    Aborted { reason: String },

    /// Best-effort loop finished with some services failing
    Incomplete { action: String, failed: Vec<String> },
}

/// Notification error variants
#[derive(Debug)]
pub enum NotificationError {
    /// Request could not be sent or the response could not be read
    Transport { reason: String },

    /// Endpoint answered with a non-success status
    Rejected { status: u16, body: String },

    /// Endpoint did not answer in time
    Timeout,
}

/// Configuration error variants
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Missing required configuration
    MissingRequired { field: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },
}

impl CommandError {
    pub fn stdout(&self) -> &str {
        match self {
            CommandError::Failed { stdout, .. } | CommandError::Aborted { stdout, .. } => stdout,
            CommandError::Launch { .. } => "",
        }
    }

    pub fn stderr(&self) -> &str {
        match self {
            CommandError::Failed { stderr, .. } | CommandError::Aborted { stderr, .. } => stderr,
            CommandError::Launch { .. } => "",
        }
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            CommandError::Failed { code, .. } | CommandError::Aborted { code, .. } => *code,
            CommandError::Launch { .. } => None,
        }
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        matches!(self, CommandError::Aborted { .. })
    }
}

impl ServiceError {
    /// Command output attached to the failure, if any
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            ServiceError::Action { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Config(e) => write!(f, "Configuration error: {}", e),
            RunnerError::Scheduler(msg) => write!(f, "Scheduler error: {}", msg),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Failed { command, code, .. } => match code {
                Some(code) => write!(f, "'{}' exited with {}", command, code),
                None => write!(f, "'{}' was terminated by a signal", command),
            },
            CommandError::Aborted {
                command, reason, ..
            } => {
                write!(f, "'{}' was aborted: {}", command, reason)
            }
            CommandError::Launch { command, reason } => {
                write!(f, "Failed to run '{}': {}", command, reason)
            }
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Action {
                service,
                action,
                source,
            } => {
                write!(f, "Failed to {} service '{}': {}", action, service, source)
            }
            ServiceError::Aborted { reason } => {
                write!(f, "Service loop aborted: {}", reason)
            }
            ServiceError::Incomplete { action, failed } => {
                write!(
                    f,
                    "Failed to {} {} service(s): {}",
                    action,
                    failed.len(),
                    failed.join(", ")
                )
            }
        }
    }
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationError::Transport { reason } => {
                write!(f, "Failed to reach notification endpoint: {}", reason)
            }
            NotificationError::Rejected { status, body } => {
                write!(f, "Notification endpoint returned {}: {}", status, body)
            }
            NotificationError::Timeout => write!(f, "Notification request timed out"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired { field } => write!(f, "{} required", field),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunnerError::Config(e) => Some(e),
            RunnerError::Scheduler(_) => None,
        }
    }
}

impl std::error::Error for CommandError {}
impl std::error::Error for NotificationError {}
impl std::error::Error for ConfigError {}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Action { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for RunnerError {
    fn from(err: ConfigError) -> Self {
        RunnerError::Config(err)
    }
}
