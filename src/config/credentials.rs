use serde::Deserialize;

/// ================================
/// Credential header configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialConfig {
    /// header name, "Authorization" when absent
    pub header: Option<String>,
    /// prepended to the resolved value, e.g. "Bearer "
    pub prefix: Option<String>,
    pub value: CredentialValue,
}

/// Where the credential value comes from. Resolved on every request.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum CredentialValue {
    Literal {
        value: String,
    },
    FromEnv {
        from_env: String,
    },
    FromFile {
        path: String,
    },
}
