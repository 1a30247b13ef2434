use std::env;

use async_trait::async_trait;

use crate::auth::{CredentialHeader, TokenProvider};
use crate::config::credentials::{CredentialConfig, CredentialValue};
use crate::error::RpError;
use crate::utils::constants::DEFAULT_CREDENTIAL_HEADER;

/// Token provider driven by the `credential` config block.
///
/// The value is looked up again on every call, so a rotated file or
/// environment variable takes effect on the next request.
#[derive(Debug, Clone)]
pub struct ConfiguredTokenProvider {
    header: String,
    prefix: Option<String>,
    value: CredentialValue,
}

impl ConfiguredTokenProvider {
    pub fn new(header: impl Into<String>, prefix: Option<String>, value: CredentialValue) -> Self {
        Self {
            header: header.into(),
            prefix,
            value,
        }
    }

    pub fn from_config(config: &CredentialConfig) -> Self {
        Self::new(
            config
                .header
                .clone()
                .unwrap_or_else(|| DEFAULT_CREDENTIAL_HEADER.to_owned()),
            config.prefix.clone(),
            config.value.clone(),
        )
    }
}

#[async_trait]
impl TokenProvider for ConfiguredTokenProvider {
    async fn auth_header(&self) -> Result<Option<CredentialHeader>, RpError> {
        let raw = resolve_credential_value(&self.value).await?;
        if raw.is_empty() {
            return Err(RpError::Credential("no authority token provided".to_owned()));
        }
        let value = match &self.prefix {
            Some(prefix) => format!("{prefix}{raw}"),
            None => raw,
        };
        Ok(Some(CredentialHeader::new(self.header.clone(), value)))
    }
}

async fn resolve_credential_value(value: &CredentialValue) -> Result<String, RpError> {
    match value {
        CredentialValue::Literal { value } => Ok(value.to_owned()),
        CredentialValue::FromEnv { from_env } => env::var(from_env)
            .map_err(|err| RpError::Credential(format!("env var {from_env}: {err}"))),
        CredentialValue::FromFile { path } => tokio::fs::read_to_string(path)
            .await
            .map(|content| content.trim().to_string())
            .map_err(|err| RpError::Credential(format!("file {path}: {err}"))),
    }
}
