//! Central repository for defaults, fixed paths and limits
//!
//! Constants are grouped by concern so the configuration loader, the
//! notifier and the binary share a single source of truth.

use std::time::Duration;

/// Notification transport constants
pub mod pushover {
    use super::Duration;

    /// Default Pushover messages endpoint
    pub const API_URL: &str = "https://api.pushover.net/1/messages.json";

    /// Title attached to every notification
    pub const TITLE: &str = "Snapraid Runner";

    /// Sound attached to every notification
    pub const SOUND: &str = "pushover";

    /// Pushover rejects messages longer than this many characters
    pub const MAX_MESSAGE_CHARS: usize = 1024;

    /// Timeout for a single notification request
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Stopping external processes on cancellation
pub mod shutdown {
    use super::Duration;

    /// Time a process gets to exit after SIGTERM before it is killed
    pub const TERMINATE_GRACE: Duration = Duration::from_secs(30);

    /// How long output is still read once a cancelled process has exited
    pub const DRAIN_GRACE: Duration = Duration::from_secs(2);
}

/// Default configuration values
pub mod defaults {
    pub const CONTAINER_RUNTIME: &str = "docker";

    pub const SNAPRAID_BIN: &str = "snapraid";

    /// Percentage of the array scrubbed per cycle
    pub const SCRUB_PERCENTAGE: u8 = 1;

    pub const CRON_SCHEDULE: &str = "* * * * *";

    pub const TIMEZONE: &str = "America/Mexico_City";

    pub const LOG_LEVEL: &str = "info";
}

/// Environment variable names
pub mod env {
    pub const PUSHOVER_TOKEN: &str = "PUSHOVER_TOKEN";
    pub const PUSHOVER_USER: &str = "PUSHOVER_USER";
    pub const PUSHOVER_API_URL: &str = "PUSHOVER_API_URL";
    pub const CONTAINERS: &str = "CONTAINERS";
    pub const CONTAINER_RUNTIME: &str = "CONTAINER_RUNTIME";
    pub const SNAPRAID_BIN: &str = "SNAPRAID_BIN";
    pub const SCRUB_PERCENTAGE: &str = "SCRUB_PERCENTAGE";
    pub const CRON_SCHEDULE: &str = "CRON_SCHEDULE";
    pub const TIMEZONE: &str = "TIMEZONE";
    pub const RUN_ONCE: &str = "RUN_ONCE";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const PRETTIFY_LOGS: &str = "PRETTIFY_LOGS";
}

/// Startup filesystem layout
pub mod paths {
    /// Configuration file mounted into the container
    pub const SNAPRAID_CONFIG_SOURCE: &str = "/config/snapraid.conf";

    /// Location snapraid reads its configuration from
    pub const SNAPRAID_CONFIG_LINK: &str = "/etc/snapraid.conf";
}
