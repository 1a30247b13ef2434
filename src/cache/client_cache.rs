use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::auth::{ConfiguredTokenProvider, NoCredential, TokenProvider};
use crate::client::ResourceProviderClient;
use crate::config::settings::ServiceConfig;
use crate::error::RpError;
use crate::observability::metrics::get_metrics;
use crate::resilience::{OperationPoller, ThrottleRetrier};
use crate::transport::{ReqwestTransport, Transport};
use crate::utils::constants::DEFAULT_REQUEST_TIMEOUT_MS;

/// One `ResourceProviderClient` per target key, created on first use and
/// kept for the lifetime of the registry.
///
/// Owned by the application's composition root and passed around by handle;
/// clones share the same map.
#[derive(Clone)]
pub struct ClientRegistry {
    endpoint: String,
    transport: Arc<dyn Transport>,
    token_provider: Arc<dyn TokenProvider>,
    throttle: ThrottleRetrier,
    poller: OperationPoller,
    clients: Arc<RwLock<HashMap<String, Arc<ResourceProviderClient>>>>,
}

impl ClientRegistry {
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
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry backed by the `reqwest` transport and the configured credential.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, RpError> {
        let settings = &config.settings;
        let timeout = Duration::from_millis(settings.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS));
        let transport = ReqwestTransport::new(timeout)?;
        let token_provider: Arc<dyn TokenProvider> = match &config.credential {
            Some(credential) => Arc::new(ConfiguredTokenProvider::from_config(credential)),
            None => Arc::new(NoCredential),
        };

        Ok(Self::new(settings.endpoint.clone(), Arc::new(transport), token_provider)
            .with_throttle(ThrottleRetrier::from_config(settings.throttle.as_ref()))
            .with_poller(OperationPoller::from_config(settings.polling.as_ref())))
    }

    pub fn with_throttle(mut self, throttle: ThrottleRetrier) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_poller(mut self, poller: OperationPoller) -> Self {
        self.poller = poller;
        self
    }

    pub async fn get_or_create(&self, key: &str) -> Result<Arc<ResourceProviderClient>, RpError> {
        if key.trim().is_empty() {
            return Err(RpError::EmptyKey);
        }

        if let Some(client) = self.clients.read().await.get(key) {
            return Ok(client.clone());
        }

        let mut map = self.clients.write().await;
        // another caller may have won the race between the two locks
        let client = map
            .entry(key.to_owned())
            .or_insert_with(|| {
                debug!("creating resource provider client for '{}'", key);
                Arc::new(self.build_client())
            })
            .clone();
        get_metrics().await.registry_clients.set(map.len() as i64);
        Ok(client)
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    fn build_client(&self) -> ResourceProviderClient {
        ResourceProviderClient::new(self.endpoint.clone(), self.transport.clone(), self.token_provider.clone())
            .with_throttle(self.throttle)
            .with_poller(self.poller)
    }
}
