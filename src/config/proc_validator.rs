//! Configuration validation with aggregated errors.
//! Every issue is collected so a broken config is reported in one pass.

use tracing::error;
use url::Url;

use crate::config::credentials::{CredentialConfig, CredentialValue};
use crate::config::settings::{ServiceConfig, SettingsConfig};

/// Returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    if let Some(credential) = &cfg.credential {
        validate_credential(credential, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        for e in &errors {
            error!("config: {}", e);
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    let endpoint = settings.endpoint.trim();
    if endpoint.is_empty() {
        errors.push("settings.endpoint must not be empty".to_string());
    } else {
        match Url::parse(endpoint) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(format!(
                "settings.endpoint must be http(s), got scheme '{}'",
                url.scheme()
            )),
            Err(e) => errors.push(format!("settings.endpoint '{}' is not a valid url: {}", endpoint, e)),
        }
    }

    if let Some(version) = &settings.default_api_version {
        if version.trim().is_empty() {
            errors.push("settings.default_api_version must not be blank".to_string());
        }
    }

    if settings.request_timeout_ms == Some(0) {
        errors.push("settings.request_timeout_ms must be > 0".to_string());
    }

    if let Some(polling) = &settings.polling {
        if polling.interval_ms == Some(0) {
            errors.push("settings.polling.interval_ms must be > 0".to_string());
        }
        if polling.timeout_seconds == Some(0) {
            errors.push("settings.polling.timeout_seconds must be > 0 when set".to_string());
        }
    }

    if let Some(logging) = &settings.logging {
        let level = logging.level.to_ascii_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            errors.push(format!("settings.logging.level '{}' is not a known level", logging.level));
        }
    }
}

fn validate_credential(credential: &CredentialConfig, errors: &mut Vec<String>) {
    if credential.header.as_deref().is_some_and(|h| h.trim().is_empty()) {
        errors.push("credential.header must not be blank".to_string());
    }
    match &credential.value {
        CredentialValue::FromEnv { from_env } if from_env.trim().is_empty() => {
            errors.push("credential.value.from_env must name a variable".to_string())
        }
        CredentialValue::FromFile { path } if path.trim().is_empty() => {
            errors.push("credential.value.path must not be empty".to_string())
        }
        _ => {}
    }
}
