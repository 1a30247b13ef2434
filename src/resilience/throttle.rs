use std::future::Future;
use std::time::Duration;

use http::StatusCode;
use tracing::{error, warn};

use crate::config::settings::ThrottleConfig;
use crate::error::RpError;
use crate::helpers::time::WaitScope;
use crate::observability::metrics::get_metrics;
use crate::transport::HttpResponse;
use crate::utils::constants::{DEFAULT_THROTTLE_RETRIES, DEFAULT_THROTTLE_WAIT_SECS, RETRY_AFTER_HEADER};

/// Resubmits requests the server answered with HTTP 429.
///
/// Up to `max_retries` resubmissions follow the first attempt, each after
/// the `Retry-After` hint (or `default_wait` without one). Any other
/// response, successful or not, is handed back untouched.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleRetrier {
    pub max_retries: u32,
    pub default_wait: Duration,
}

impl Default for ThrottleRetrier {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_THROTTLE_RETRIES,
            default_wait: Duration::from_secs(DEFAULT_THROTTLE_WAIT_SECS),
        }
    }
}

impl ThrottleRetrier {
    pub fn new(max_retries: u32, default_wait: Duration) -> Self {
        Self { max_retries, default_wait }
    }

    pub fn from_config(config: Option<&ThrottleConfig>) -> Self {
        Self {
            max_retries: config.and_then(|c| c.max_retries).unwrap_or(DEFAULT_THROTTLE_RETRIES),
            default_wait: Duration::from_secs(
                config
                    .and_then(|c| c.default_wait_seconds)
                    .unwrap_or(DEFAULT_THROTTLE_WAIT_SECS),
            ),
        }
    }

    pub async fn run<F, Fut>(&self, scope: &WaitScope, mut attempt: F) -> Result<HttpResponse, RpError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<HttpResponse, RpError>>,
    {
        let mut remaining = self.max_retries;

        loop {
            scope.check()?;
            let response = attempt().await?;
            if response.status != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if remaining == 0 {
                error!("throttled after {} retries, giving up", self.max_retries);
                return Err(RpError::ThrottleExhausted {
                    status: response.status.as_u16(),
                    body: response.body,
                    attempts: self.max_retries,
                });
            }

            let wait = self.wait_hint(&response);
            remaining -= 1;
            warn!(
                retry = self.max_retries - remaining,
                max_retries = self.max_retries,
                wait_ms = wait.as_millis() as u64,
                "throttled, retrying"
            );
            get_metrics().await.throttle_retries.inc();
            scope.sleep(wait).await?;
        }
    }

    /// `Retry-After` in whole seconds; missing or unparseable hints fall
    /// back to the default wait.
    pub fn wait_hint(&self, response: &HttpResponse) -> Duration {
        response
            .header(RETRY_AFTER_HEADER)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.default_wait)
    }
}
