use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::settings::PollingConfig;
use crate::error::RpError;
use crate::helpers::time::WaitScope;
use crate::observability::metrics::get_metrics;
use crate::transport::HttpResponse;
use crate::utils::constants::{
    ASYNC_OPERATION_HEADER, DEFAULT_POLL_INTERVAL_MS, OPERATION_FAILED_MSG, STATUS_CANCELED, STATUS_FAILED,
    STATUS_SUCCEEDED,
};

/// Body of an operation-status URL.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    pub status: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub properties: Option<Value>,
    pub error: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    Succeeded,
    Failed,
    Canceled,
    /// any non-terminal status string, usually "Running" or "InProgress"
    InProgress(String),
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationState::InProgress(_))
    }
}

impl OperationStatus {
    /// `None` when the payload carries no status at all.
    pub fn state(&self) -> Option<OperationState> {
        let status = self.status.as_deref()?;
        Some(match status {
            STATUS_SUCCEEDED => OperationState::Succeeded,
            STATUS_FAILED => OperationState::Failed,
            STATUS_CANCELED => OperationState::Canceled,
            other => OperationState::InProgress(other.to_owned()),
        })
    }

    pub fn error_detail(&self) -> String {
        self.error
            .as_ref()
            .map(|error| error.to_string())
            .unwrap_or_else(|| OPERATION_FAILED_MSG.to_owned())
    }
}

/// What a dispatched request turned out to be.
#[derive(Debug)]
pub enum Settled {
    Complete(HttpResponse),
    LongRunning { status_url: String, response: HttpResponse },
}

/// Classify a response that is no longer throttled.
///
/// Any 2xx carrying the async-operation header is a long-running operation,
/// 202 and 200 alike. Other 2xx responses are complete; everything else is a
/// request failure.
pub fn settle(response: HttpResponse) -> Result<Settled, RpError> {
    if !response.status.is_success() {
        return Err(RpError::from_response(&response));
    }
    let status_url = response
        .header(ASYNC_OPERATION_HEADER)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_owned);

    Ok(match status_url {
        Some(status_url) => Settled::LongRunning { status_url, response },
        None => Settled::Complete(response),
    })
}

/// Polls an operation-status URL until the operation reaches a terminal
/// status. Polls are strictly sequential, one `interval` apart.
#[derive(Debug, Clone, Copy)]
pub struct OperationPoller {
    pub interval: Duration,
    /// default deadline for calls that set none
    pub timeout: Option<Duration>,
}

impl Default for OperationPoller {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: None,
        }
    }
}

impl OperationPoller {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    pub fn from_config(config: Option<&PollingConfig>) -> Self {
        Self {
            interval: Duration::from_millis(
                config.and_then(|c| c.interval_ms).unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            timeout: config.and_then(|c| c.timeout_seconds).map(Duration::from_secs),
        }
    }

    /// `fetch_status` performs one status GET; `Ok(None)` means the body
    /// could not be decoded.
    pub async fn poll_until_terminal<F, Fut>(
        &self,
        status_url: &str,
        scope: &WaitScope,
        mut fetch_status: F,
    ) -> Result<OperationStatus, RpError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<OperationStatus>, RpError>>,
    {
        let metrics = get_metrics().await;
        let unavailable = || RpError::OperationStatusUnavailable {
            url: status_url.to_owned(),
        };
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            let status = fetch_status().await?.ok_or_else(unavailable)?;
            let state = status.state().ok_or_else(unavailable)?;

            match state {
                OperationState::Succeeded => {
                    metrics.operation_polls.with_label_values(&[STATUS_SUCCEEDED]).inc();
                    info!("operation {} succeeded after {} polls", status_url, polls);
                    return Ok(status);
                }
                OperationState::Failed | OperationState::Canceled => {
                    let label = status.status.as_deref().unwrap_or(STATUS_FAILED);
                    metrics.operation_polls.with_label_values(&[label]).inc();
                    let detail = status.error_detail();
                    error!("operation {} ended as {}: {}", status_url, label, detail);
                    return Err(RpError::Operation { detail });
                }
                OperationState::InProgress(current) => {
                    metrics.operation_polls.with_label_values(&["InProgress"]).inc();
                    debug!(poll = polls, status = %current, "operation still running");
                    scope.sleep(self.interval).await?;
                }
            }
        }
    }
}
