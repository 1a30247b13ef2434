//! Shared constants and invariants

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

// Throttling
pub const RETRY_AFTER_HEADER: &str = "retry-after";
pub const DEFAULT_THROTTLE_RETRIES: u32 = 12;
pub const DEFAULT_THROTTLE_WAIT_SECS: u64 = 5;

// Long-running operations
pub const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
pub const LOCATION_HEADER: &str = "location";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

pub const STATUS_SUCCEEDED: &str = "Succeeded";
pub const STATUS_FAILED: &str = "Failed";
pub const STATUS_CANCELED: &str = "Canceled";
pub const OPERATION_FAILED_MSG: &str = "Operation could not be completed";

// Request building
pub const API_VERSION_PARAM: &str = "api-version";
pub const FILTER_PARAM: &str = "$filter";
pub const METRIC_NAMES_PARAM: &str = "metricnames";
pub const CONTENT_TYPE_JSON: &str = "application/json";

// Credentials
pub const DEFAULT_CREDENTIAL_HEADER: &str = "Authorization";
