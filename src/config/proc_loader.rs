use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::config::proc_validator;
use crate::config::settings::{LoggingConfig, PollingConfig, ServiceConfig, ThrottleConfig};
use crate::utils::constants::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_THROTTLE_RETRIES, DEFAULT_THROTTLE_WAIT_SECS,
};

/// Load, expand and validate config from a YAML file
pub fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let expanded = expand_env_vars(&content)?;
    parse_config(&expanded)
}

pub fn parse_config(content: &str) -> Result<ServiceConfig> {
    let mut service_config: ServiceConfig = serde_yaml::from_str(content).inspect_err(|e| {
        error!("parse config error: {}", e);
    })?;

    apply_defaults(&mut service_config);

    debug!("validating config ...");
    proc_validator::validate_service_config(&service_config)
        .map_err(|errors| anyhow!("config is not valid:\n  - {}", errors.join("\n  - ")))?;

    Ok(service_config)
}

fn apply_defaults(service_config: &mut ServiceConfig) {
    let settings = &mut service_config.settings;

    settings.logging.get_or_insert_with(LoggingConfig::default);
    settings.request_timeout_ms.get_or_insert(DEFAULT_REQUEST_TIMEOUT_MS);

    let throttle = settings.throttle.get_or_insert_with(ThrottleConfig::default);
    throttle.max_retries.get_or_insert(DEFAULT_THROTTLE_RETRIES);
    throttle.default_wait_seconds.get_or_insert(DEFAULT_THROTTLE_WAIT_SECS);

    let polling = settings.polling.get_or_insert_with(PollingConfig::default);
    polling.interval_ms.get_or_insert(DEFAULT_POLL_INTERVAL_MS);
}

/// `${VAR}` and `${VAR:default}`; unset variables without a default become empty.
pub fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string())
}
