use std::time::Duration;

use http::Method;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::RpError;
use crate::transport::HttpRequest;
use crate::utils::constants::{API_VERSION_PARAM, CONTENT_TYPE_JSON, FILTER_PARAM, METRIC_NAMES_PARAM};

/// Per-call knobs of a resource request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// raw query string appended after `api-version`, e.g. `a=1&b=2`
    pub query: Option<String>,
    pub filter: Option<String>,
    pub metric_names: Option<String>,
    pub headers: Vec<(String, String)>,
    /// overrides `application/json` on requests with a body
    pub content_type: Option<String>,
    /// when set, a completed long-running operation is not followed by a
    /// GET of the resource
    pub skip_resource_validation: bool,
    pub cancellation: Option<CancellationToken>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_metric_names(mut self, metric_names: impl Into<String>) -> Self {
        self.metric_names = Some(metric_names.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn skip_resource_validation(mut self) -> Self {
        self.skip_resource_validation = true;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Everything needed to issue one logical resource call.
///
/// Built fresh per call and never mutated afterwards; every attempt (first
/// try, throttle retry) derives a new `HttpRequest` from it.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    body: Option<String>,
    headers: Vec<(String, String)>,
    skip_resource_validation: bool,
}

impl RequestDescriptor {
    pub fn new(
        method: Method,
        host: &str,
        path: &str,
        api_version: &str,
        body: Option<String>,
        options: &RequestOptions,
    ) -> Result<Self, RpError> {
        let url = build_url(host, path, api_version, options)?;

        let mut headers = Vec::with_capacity(options.headers.len() + 1);
        if carries_body(&method) {
            let content_type = options.content_type.as_deref().unwrap_or(CONTENT_TYPE_JSON);
            headers.push(("Content-Type".to_owned(), content_type.to_owned()));
        }
        headers.extend(options.headers.iter().cloned());

        Ok(Self {
            method,
            url,
            body,
            headers,
            skip_resource_validation: options.skip_resource_validation,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the resource should be fetched again once an asynchronous
    /// operation started by this request has succeeded.
    pub fn revalidates_resource(&self) -> bool {
        !self.skip_resource_validation && self.method != Method::DELETE
    }

    pub fn to_http_request(&self) -> HttpRequest {
        HttpRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Serialize a request body. Strings are sent as-is, everything else as JSON.
/// A body serializing to `null` means "no body".
pub fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Option<String>, RpError> {
    match serde_json::to_value(body).map_err(RpError::Encode)? {
        Value::Null => Ok(None),
        Value::String(raw) => Ok(Some(raw)),
        value => Ok(Some(value.to_string())),
    }
}

/// `<host><path>?api-version=<v>[&$filter=..][&metricnames=..][&<query>]`
pub fn build_url(host: &str, path: &str, api_version: &str, options: &RequestOptions) -> Result<String, RpError> {
    let joined = format!(
        "{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined).map_err(|source| RpError::InvalidUrl {
        url: joined.clone(),
        source,
    })?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair(API_VERSION_PARAM, api_version);
        if let Some(filter) = &options.filter {
            pairs.append_pair(FILTER_PARAM, filter);
        }
        if let Some(metric_names) = &options.metric_names {
            pairs.append_pair(METRIC_NAMES_PARAM, metric_names);
        }
    }

    if let Some(extra) = options.query.as_deref().map(|q| q.trim_start_matches(['?', '&'])) {
        if !extra.is_empty() {
            let query = format!("{}&{}", url.query().unwrap_or_default(), extra);
            url.set_query(Some(&query));
        }
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HOST: &str = "https://management.example.com";

    #[test]
    fn url_joins_host_path_and_api_version() {
        let url = build_url(HOST, "/subscriptions/s1/resourceGroups/rg", "2023-09-15-preview", &RequestOptions::default()).unwrap();
        assert_eq!(
            url,
            "https://management.example.com/subscriptions/s1/resourceGroups/rg?api-version=2023-09-15-preview"
        );
    }

    #[test]
    fn url_tolerates_slashes_on_both_sides() {
        let url = build_url("https://host/", "/a/b", "1", &RequestOptions::default()).unwrap();
        assert_eq!(url, "https://host/a/b?api-version=1");
        let url = build_url("https://host", "a/b", "1", &RequestOptions::default()).unwrap();
        assert_eq!(url, "https://host/a/b?api-version=1");
    }

    #[test]
    fn extra_query_is_appended_after_api_version() {
        let options = RequestOptions::new().with_query("?top=5&skip=1");
        let url = build_url(HOST, "/r", "v1", &options).unwrap();
        assert_eq!(url, "https://management.example.com/r?api-version=v1&top=5&skip=1");
    }

    #[test]
    fn filter_and_metric_names_are_encoded() {
        let options = RequestOptions::new()
            .with_filter("name eq 'x'")
            .with_metric_names("Total Requests");
        let url = build_url(HOST, "/r", "v1", &options).unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("api-version".to_string(), "v1".to_string()),
                ("$filter".to_string(), "name eq 'x'".to_string()),
                ("metricnames".to_string(), "Total Requests".to_string()),
            ]
        );
    }

    #[test]
    fn invalid_host_is_rejected() {
        let err = build_url("not a host", "/r", "v1", &RequestOptions::default()).unwrap_err();
        assert!(matches!(err, RpError::InvalidUrl { .. }));
    }

    #[test]
    fn string_bodies_pass_through_and_others_are_json() {
        assert_eq!(encode_body("raw text").unwrap().as_deref(), Some("raw text"));
        assert_eq!(
            encode_body(&json!({"location": "westus"})).unwrap().as_deref(),
            Some(r#"{"location":"westus"}"#)
        );
        assert_eq!(encode_body(&()).unwrap(), None);
    }

    #[test]
    fn body_verbs_get_json_content_type_and_custom_headers() {
        let options = RequestOptions::new().with_header("x-ms-client-request-id", "abc");
        let descriptor = RequestDescriptor::new(Method::PUT, HOST, "/r", "v1", Some("{}".into()), &options).unwrap();
        let request = descriptor.to_http_request();
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("x-ms-client-request-id"), Some("abc"));
        assert_eq!(request.body.as_deref(), Some("{}"));

        let get = RequestDescriptor::new(Method::GET, HOST, "/r", "v1", None, &RequestOptions::default()).unwrap();
        assert!(get.to_http_request().header("content-type").is_none());
    }

    #[test]
    fn content_type_can_be_overridden() {
        let options = RequestOptions::new().with_content_type("application/merge-patch+json");
        let descriptor = RequestDescriptor::new(Method::PATCH, HOST, "/r", "v1", None, &options).unwrap();
        assert_eq!(
            descriptor.to_http_request().header("Content-Type"),
            Some("application/merge-patch+json")
        );
    }

    #[test]
    fn delete_never_revalidates() {
        let delete = RequestDescriptor::new(Method::DELETE, HOST, "/r", "v1", None, &RequestOptions::default()).unwrap();
        assert!(!delete.revalidates_resource());
        let put = RequestDescriptor::new(Method::PUT, HOST, "/r", "v1", None, &RequestOptions::default()).unwrap();
        assert!(put.revalidates_resource());
        let skipped = RequestDescriptor::new(
            Method::PUT,
            HOST,
            "/r",
            "v1",
            None,
            &RequestOptions::new().skip_resource_validation(),
        )
        .unwrap();
        assert!(!skipped.revalidates_resource());
    }
}
