//! Credential headers and the providers that produce them.

use std::fmt;

use async_trait::async_trait;

use crate::error::RpError;

pub mod configured;

pub use configured::ConfiguredTokenProvider;

/// A header proving authorization, attached to one outgoing request.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHeader {
    pub name: String,
    pub value: String,
}

impl CredentialHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn bearer(token: &str) -> Self {
        Self::new("Authorization", format!("Bearer {token}"))
    }
}

// never print the secret
impl fmt::Debug for CredentialHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHeader")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Supplies the credential header for a request.
///
/// Called once per outgoing request, including throttle retries and status
/// polls. Any caching of tokens belongs to the implementation.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn auth_header(&self) -> Result<Option<CredentialHeader>, RpError>;
}

/// Always returns the same header.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider(pub CredentialHeader);

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn auth_header(&self) -> Result<Option<CredentialHeader>, RpError> {
        Ok(Some(self.0.clone()))
    }
}

/// Sends requests without any credential header.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredential;

#[async_trait]
impl TokenProvider for NoCredential {
    async fn auth_header(&self) -> Result<Option<CredentialHeader>, RpError> {
        Ok(None)
    }
}
