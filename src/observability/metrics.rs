use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

/// Text exposition of everything recorded so far.
pub async fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = get_metrics().await.registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Request metrics
    pub requests: IntCounterVec,
    pub request_failures: IntCounterVec,
    pub request_duration: HistogramVec,

    // Resilience
    pub throttle_retries: IntCounter,
    pub operation_polls: IntCounterVec,

    // Registry
    pub registry_clients: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("rpclient".into()), None).expect("metrics registry");

        let metrics: Arc<Metrics> = Arc::new(Self {
            requests: IntCounterVec::new(Opts::new("requests_total", "Resource calls by HTTP method"), &["method"]).expect("metric"),
            request_failures: IntCounterVec::new(Opts::new("request_failures_total", "Failed resource calls by method and phase"), &["method", "phase"]).expect("metric"),
            request_duration: HistogramVec::new(HistogramOpts::new("request_duration_seconds", "Resource call duration seconds, polling included").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0, 60.0, 300.0]), &["method"]).expect("metric"),

            throttle_retries: IntCounter::new("throttle_retries_total", "Requests resubmitted after HTTP 429").expect("metric"),
            operation_polls: IntCounterVec::new(Opts::new("operation_polls_total", "Operation status polls by observed status"), &["status"]).expect("metric"),

            registry_clients: IntGauge::new("registry_clients", "Clients held by the client registry").expect("metric"),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.requests.clone())).expect("register");
        reg.register(Box::new(metrics.request_failures.clone())).expect("register");
        reg.register(Box::new(metrics.request_duration.clone())).expect("register");
        reg.register(Box::new(metrics.throttle_retries.clone())).expect("register");
        reg.register(Box::new(metrics.operation_polls.clone())).expect("register");
        reg.register(Box::new(metrics.registry_clients.clone())).expect("register");

        metrics
    }
}
