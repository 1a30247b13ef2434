use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::auth::TokenProvider;
use crate::error::RpError;
use crate::helpers::time::WaitScope;
use crate::observability::metrics::get_metrics;
use crate::request::{encode_body, RequestDescriptor, RequestOptions};
use crate::resilience::{settle, OperationPoller, OperationStatus, Settled, ThrottleRetrier};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::utils::constants::{ASYNC_OPERATION_HEADER, LOCATION_HEADER};

/// REST verbs against one management-plane host.
///
/// Each call attaches a freshly resolved credential, resubmits throttled
/// requests and drives long-running operations to completion before
/// returning. The client itself holds no per-call state, so it can be shared
/// freely between concurrent calls.
pub struct ResourceProviderClient {
    endpoint: String,
    transport: Arc<dyn Transport>,
    token_provider: Arc<dyn TokenProvider>,
    throttle: ThrottleRetrier,
    poller: OperationPoller,
}

impl std::fmt::Debug for ResourceProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceProviderClient")
            .field("endpoint", &self.endpoint)
            .field("throttle", &self.throttle)
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}

impl ResourceProviderClient {
    pub fn new(
        endpoint: impl Into<String>,
        transport: Arc<dyn Transport>,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            token_provider,
            throttle: ThrottleRetrier::default(),
            poller: OperationPoller::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: ThrottleRetrier) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_poller(mut self, poller: OperationPoller) -> Self {
        self.poller = poller;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        options: RequestOptions,
    ) -> Result<T, RpError> {
        let body = self.call(Method::GET, path, api_version, None, &options).await?;
        decode(&body)
    }

    pub async fn post<T, B>(&self, path: &str, api_version: &str, body: &B, options: RequestOptions) -> Result<T, RpError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.call(Method::POST, path, api_version, encode_body(body)?, &options).await?;
        decode(&body)
    }

    pub async fn put<T, B>(&self, path: &str, api_version: &str, body: &B, options: RequestOptions) -> Result<T, RpError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.call(Method::PUT, path, api_version, encode_body(body)?, &options).await?;
        decode(&body)
    }

    pub async fn patch<T, B>(&self, path: &str, api_version: &str, body: &B, options: RequestOptions) -> Result<T, RpError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.call(Method::PATCH, path, api_version, encode_body(body)?, &options).await?;
        decode(&body)
    }

    pub async fn delete(&self, path: &str, api_version: &str, options: RequestOptions) -> Result<(), RpError> {
        self.call(Method::DELETE, path, api_version, None, &options).await?;
        Ok(())
    }

    /// Dispatch once (throttle retries included) without driving a
    /// long-running operation. Returns the decoded body together with the
    /// operation-status URL, taken from `Azure-AsyncOperation` or else
    /// `Location`, for callers that poll on their own.
    pub async fn send_without_polling<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        api_version: &str,
        body: Option<&Value>,
        options: RequestOptions,
    ) -> Result<(T, Option<String>), RpError> {
        let body = body.map(encode_body).transpose()?.flatten();
        let descriptor = RequestDescriptor::new(method, &self.endpoint, path, api_version, body, &options)?;
        let scope = self.scope_for(&options);

        let response = self.dispatch(&descriptor.to_http_request(), &scope).await?;
        if !response.status.is_success() {
            return Err(RpError::from_response(&response));
        }
        let status_url = response
            .header(ASYNC_OPERATION_HEADER)
            .or_else(|| response.header(LOCATION_HEADER))
            .filter(|url| !url.trim().is_empty())
            .map(str::to_owned);
        Ok((decode(&response.body)?, status_url))
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        api_version: &str,
        body: Option<String>,
        options: &RequestOptions,
    ) -> Result<String, RpError> {
        let metrics = get_metrics().await;
        let start = Instant::now();
        let method_label = method.as_str().to_owned();
        metrics.requests.with_label_values(&[&method_label]).inc();

        let result = match RequestDescriptor::new(method, &self.endpoint, path, api_version, body, options) {
            Ok(descriptor) => self.execute(&descriptor, &self.scope_for(options)).await,
            Err(err) => Err(err),
        };

        metrics
            .request_duration
            .with_label_values(&[&method_label])
            .observe(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            metrics
                .request_failures
                .with_label_values(&[method_label.as_str(), err.phase().as_str()])
                .inc();
        }
        result
    }

    fn scope_for(&self, options: &RequestOptions) -> WaitScope {
        WaitScope::new(options.cancellation.clone(), options.timeout.or(self.poller.timeout))
    }

    /// Dispatch, then follow a long-running operation if the response
    /// announced one. Returns the final body text.
    async fn execute(&self, descriptor: &RequestDescriptor, scope: &WaitScope) -> Result<String, RpError> {
        let response = self.dispatch(&descriptor.to_http_request(), scope).await?;

        let status_url = match settle(response)? {
            Settled::Complete(response) => return Ok(response.body),
            Settled::LongRunning { status_url, response } => {
                info!(
                    "{} {} answered {}, polling operation {}",
                    descriptor.method(),
                    descriptor.url(),
                    response.status,
                    status_url
                );
                status_url
            }
        };

        let status_url = status_url.as_str();
        self.poller
            .poll_until_terminal(status_url, scope, move || async move {
                self.fetch_operation_status(status_url, scope).await
            })
            .await?;

        if !descriptor.revalidates_resource() {
            return Ok(String::new());
        }

        let resource = self.dispatch(&HttpRequest::get(descriptor.url()), scope).await?;
        if !resource.status.is_success() {
            return Err(RpError::from_response(&resource));
        }
        Ok(resource.body)
    }

    async fn fetch_operation_status(
        &self,
        status_url: &str,
        scope: &WaitScope,
    ) -> Result<Option<OperationStatus>, RpError> {
        let response = self.dispatch(&HttpRequest::get(status_url), scope).await?;
        if !response.status.is_success() {
            return Err(RpError::from_response(&response));
        }
        Ok(serde_json::from_str(&response.body).ok())
    }

    /// One logical send: credential resolved per attempt, 429s retried.
    async fn dispatch(&self, template: &HttpRequest, scope: &WaitScope) -> Result<HttpResponse, RpError> {
        self.throttle
            .run(scope, move || async move {
                let mut request = template.clone();
                if let Some(credential) = self.token_provider.auth_header().await? {
                    request.headers.push((credential.name, credential.value));
                }
                debug!("{} {}", request.method, request.url);
                self.transport.send(&request).await
            })
            .await
    }
}

/// Empty bodies decode as JSON `null`.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RpError> {
    if body.trim().is_empty() {
        return serde_json::from_value(Value::Null).map_err(RpError::Decode);
    }
    serde_json::from_str(body).map_err(RpError::Decode)
}
