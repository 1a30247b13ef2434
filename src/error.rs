//! Error taxonomy of the resource client.
//!
//! Every failure carries the phase that produced it, so callers can tell a
//! dead connection from an exhausted throttle budget or a failed operation.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::transport::HttpResponse;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RpError {
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("still throttled after {attempts} retries (HTTP {status}): {body}")]
    ThrottleExhausted { status: u16, body: String, attempts: u32 },

    #[error("request failed with HTTP {status}: {message}")]
    Request {
        status: u16,
        code: Option<String>,
        message: String,
        body: String,
    },

    #[error("operation failed: {detail}")]
    Operation { detail: String },

    #[error("could not retrieve operation status from {url}")]
    OperationStatusUnavailable { url: String },

    #[error("credential error: {0}")]
    Credential(String),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("client key must not be empty")]
    EmptyKey,

    #[error("invalid client configuration: {0}")]
    Configuration(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Which part of a call produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Transport,
    Throttle,
    Request,
    Operation,
    Credential,
    Client,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Transport => "transport",
            Phase::Throttle => "throttle",
            Phase::Request => "request",
            Phase::Operation => "operation",
            Phase::Credential => "credential",
            Phase::Client => "client",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RpError {
    pub fn phase(&self) -> Phase {
        match self {
            RpError::Transport { .. } => Phase::Transport,
            RpError::ThrottleExhausted { .. } => Phase::Throttle,
            RpError::Request { .. } | RpError::Decode(_) => Phase::Request,
            RpError::Operation { .. } | RpError::OperationStatusUnavailable { .. } => Phase::Operation,
            RpError::Credential(_) => Phase::Credential,
            RpError::Encode(_)
            | RpError::InvalidUrl { .. }
            | RpError::EmptyKey
            | RpError::Configuration(_)
            | RpError::Cancelled
            | RpError::DeadlineExceeded(_) => Phase::Client,
        }
    }

    /// HTTP status attached to the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RpError::ThrottleExhausted { status, .. } | RpError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build a request failure out of a non-success response.
    ///
    /// The management API reports errors either as `{code, message}` or
    /// wrapped in a top level `error` object; anything else keeps the raw
    /// body text as the message.
    pub fn from_response(response: &HttpResponse) -> Self {
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&response.body) {
            Ok(ErrorEnvelope::Wrapped { error }) => (error.code, error.message),
            Ok(ErrorEnvelope::Flat(error)) => (error.code, error.message),
            Err(_) => (None, None),
        };
        RpError::Request {
            status: response.status.as_u16(),
            code,
            message: message.unwrap_or_else(|| response.body.clone()),
            body: response.body.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    Wrapped { error: ErrorDetail },
    Flat(ErrorDetail),
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}
