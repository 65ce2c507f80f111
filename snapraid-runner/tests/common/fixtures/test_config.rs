//! Configuration used by the behavioural tests

use snapraid_runner::Config;
use std::collections::HashMap;

pub const SERVICES: [&str; 3] = ["media-server-plex-1", "radarr", "sonarr"];

/// Build a config for `services` without touching the process environment
pub fn test_config(services: &[&str]) -> Config {
    let mut vars = HashMap::new();
    vars.insert("PUSHOVER_TOKEN", "test-token".to_string());
    vars.insert("PUSHOVER_USER", "test-user".to_string());
    vars.insert("CONTAINERS", services.join(","));
    vars.insert("SCRUB_PERCENTAGE", "5".to_string());
    vars.insert("TIMEZONE", "UTC".to_string());

    Config::from_lookup(|key: &str| vars.get(key).cloned()).expect("test config should be valid")
}
