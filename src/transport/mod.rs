//! HTTP transport seam.
//!
//! Requests and responses are plain data so the retry and polling layers can
//! be driven by any transport, the `reqwest` one in production and scripted
//! ones in tests.

use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};

use crate::error::RpError;

pub mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;

/// A single outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: Method::GET,
            url: url.to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    /// Header value as text; missing and non-UTF8 values are both `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Issues exactly one HTTP request. No retries, no status interpretation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RpError>;
}
