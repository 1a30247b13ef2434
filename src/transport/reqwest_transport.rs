use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use reqwest::Client;
use tracing::trace;

use crate::error::RpError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, RpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RpError::Configuration(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RpError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let to_transport_error = |err: reqwest::Error| RpError::Transport {
            url: request.url.clone(),
            source: Box::new(err),
        };

        let response = builder.send().await.map_err(to_transport_error)?;
        let status = response.status();
        let headers: HeaderMap = response.headers().clone();
        let body = response.text().await.map_err(to_transport_error)?;
        trace!("{} {} -> {}", request.method, request.url, status);

        Ok(HttpResponse { status, headers, body })
    }
}
