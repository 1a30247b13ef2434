use serde::Deserialize;

use crate::config::credentials::CredentialConfig;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub credential: Option<CredentialConfig>,
}

/// ================================
/// Client-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    /// management-plane host, e.g. https://management.azure.com
    pub endpoint: String,
    pub default_api_version: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub throttle: Option<ThrottleConfig>,
    pub polling: Option<PollingConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ThrottleConfig {
    /// resubmissions after the first throttled attempt
    pub max_retries: Option<u32>,
    /// wait used when a 429 carries no Retry-After header
    pub default_wait_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PollingConfig {
    pub interval_ms: Option<u64>,
    /// absent means poll until the operation ends
    pub timeout_seconds: Option<u64>,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}
