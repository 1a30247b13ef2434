// shared fixtures for the test modules
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;
use tokio::time::Instant;

use crate::auth::{CredentialHeader, TokenProvider};
use crate::client::ResourceProviderClient;
use crate::error::RpError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

pub const HOST: &str = "https://management.example.com";
pub const API_VERSION: &str = "2023-09-15-preview";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn response(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    HttpResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers: map,
        body: body.to_owned(),
    }
}

pub fn json_response(status: u16, headers: &[(&str, &str)], body: Value) -> HttpResponse {
    response(status, headers, &body.to_string())
}

/// A request as the scripted transport saw it, stamped with (tokio) time.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub at: Instant,
    pub request: HttpRequest,
}

/// In-memory transport answering from a script, then from `fallback` once
/// the script runs dry.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<HttpResponse>>,
    fallback: Option<HttpResponse>,
    recorded: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn repeating(response: HttpResponse) -> Arc<Self> {
        Arc::new(Self {
            fallback: Some(response),
            ..Default::default()
        })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.request.url).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RpError> {
        self.recorded.lock().unwrap().push(Recorded {
            at: Instant::now(),
            request: request.clone(),
        });
        let next = self.script.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone()).ok_or_else(|| RpError::Transport {
            url: request.url.clone(),
            source: "script exhausted".into(),
        })
    }
}

/// Hands out `Bearer token-<n>`, a new n on every call.
#[derive(Default)]
pub struct CountingTokenProvider {
    calls: AtomicUsize,
}

impl CountingTokenProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for CountingTokenProvider {
    async fn auth_header(&self) -> Result<Option<CredentialHeader>, RpError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(CredentialHeader::bearer(&format!("token-{n}"))))
    }
}

pub fn scripted_client(transport: Arc<ScriptedTransport>) -> (ResourceProviderClient, Arc<CountingTokenProvider>) {
    let tokens = Arc::new(CountingTokenProvider::default());
    let client = ResourceProviderClient::new(HOST, transport, tokens.clone());
    (client, tokens)
}
