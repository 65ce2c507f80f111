// File: snapraid-runner/src/logging.rs
use crate::constants::{defaults, env};
use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global subscriber from `LOG_LEVEL` and `PRETTIFY_LOGS`
pub fn init() -> Result<()> {
    let level = std::env::var(env::LOG_LEVEL).unwrap_or_else(|_| defaults::LOG_LEVEL.to_string());
    let prettify = std::env::var(env::PRETTIFY_LOGS)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let env_filter = build_filter(&level)?;

    if prettify {
        fmt().with_env_filter(env_filter).with_target(false).init();
    } else {
        fmt().json().with_env_filter(env_filter).init();
    }
    Ok(())
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::try_new(level)?
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?))
}
