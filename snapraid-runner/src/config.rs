// File: snapraid-runner/src/config.rs
use crate::constants::{defaults, env, pushover};
use crate::errors::ConfigError;
use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct Config {
    pub pushover_token: String,
    pub pushover_user: String,
    pub pushover_api_url: String,
    /// Ordered list of services; stop and start both follow this order
    pub containers: Vec<String>,
    pub container_runtime: String,
    pub snapraid_bin: String,
    pub scrub_percentage: u8,
    pub cron_schedule: String,
    pub timezone: Tz,
    pub run_once: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let pushover_token = get(env::PUSHOVER_TOKEN).ok_or_else(|| missing(env::PUSHOVER_TOKEN))?;
        let pushover_user = get(env::PUSHOVER_USER).ok_or_else(|| missing(env::PUSHOVER_USER))?;

        let containers =
            parse_comma_separated(lookup(env::CONTAINERS).as_deref(), env::CONTAINERS)?;
        if let Some(position) = containers.iter().position(|name| name.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: env::CONTAINERS.to_string(),
                reason: format!("empty service name at position {}", position + 1),
            });
        }

        let scrub_percentage = match get(env::SCRUB_PERCENTAGE) {
            Some(raw) => parse_percentage(&raw)?,
            None => defaults::SCRUB_PERCENTAGE,
        };

        let timezone_name = get(env::TIMEZONE).unwrap_or_else(|| defaults::TIMEZONE.to_string());
        let timezone = timezone_name
            .trim()
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidValue {
                field: env::TIMEZONE.to_string(),
                reason: e.to_string(),
            })?;

        let run_once = match get(env::RUN_ONCE) {
            Some(raw) => parse_bool(&raw, env::RUN_ONCE)?,
            None => false,
        };

        Ok(Self {
            pushover_token,
            pushover_user,
            pushover_api_url: get(env::PUSHOVER_API_URL)
                .unwrap_or_else(|| pushover::API_URL.to_string()),
            containers,
            container_runtime: get(env::CONTAINER_RUNTIME)
                .unwrap_or_else(|| defaults::CONTAINER_RUNTIME.to_string()),
            snapraid_bin: get(env::SNAPRAID_BIN)
                .unwrap_or_else(|| defaults::SNAPRAID_BIN.to_string()),
            scrub_percentage,
            cron_schedule: get(env::CRON_SCHEDULE)
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| defaults::CRON_SCHEDULE.to_string()),
            timezone,
            run_once,
        })
    }

    /// One-line summary safe to log; credentials are masked
    pub fn redacted_summary(&self) -> String {
        format!(
            "token={} user={} containers=[{}] runtime={} snapraid={} scrub_percentage={} schedule='{}' timezone={} run_once={}",
            mask(&self.pushover_token),
            mask(&self.pushover_user),
            self.containers.join(", "),
            self.container_runtime,
            self.snapraid_bin,
            self.scrub_percentage,
            self.cron_schedule,
            self.timezone,
            self.run_once
        )
    }
}

/// Split a comma-separated variable into trimmed items
pub fn parse_comma_separated(value: Option<&str>, name: &str) -> Result<Vec<String>, ConfigError> {
    let value = value.ok_or_else(|| missing(name))?;
    Ok(value.split(',').map(|item| item.trim().to_string()).collect())
}

fn parse_percentage(raw: &str) -> Result<u8, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        field: env::SCRUB_PERCENTAGE.to_string(),
        reason,
    };

    let value = raw
        .trim()
        .parse::<u8>()
        .map_err(|e| invalid(format!("'{}' is not an integer percentage: {}", raw, e)))?;

    if value > 100 {
        return Err(invalid(format!("{} is greater than 100", value)));
    }
    Ok(value)
}

fn parse_bool(raw: &str, field: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingRequired {
        field: field.to_string(),
    }
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}***", visible)
}
