// End-to-end over real sockets with an axum server standing in for a
// resource provider:
//  - PUT answered 202 + Azure-AsyncOperation
//  - status endpoint reports Running twice, then Succeeded
//  - resource GET is throttled once before answering
// The client must come back with the resource body.

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Json;
    use serde_json::Value;

    use crate::auth::{CredentialHeader, StaticTokenProvider};
    use crate::client::ResourceProviderClient;
    use crate::request::RequestOptions;
    use crate::resilience::OperationPoller;
    use crate::tests::common::{json, spawn_axum, Router, API_VERSION};
    use crate::transport::ReqwestTransport;

    #[derive(Default)]
    struct Counters {
        puts: AtomicUsize,
        polls: AtomicUsize,
        gets: AtomicUsize,
    }

    type Shared = Arc<Counters>;

    async fn put_account(State(counters): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
        counters.puts.fetch_add(1, Ordering::SeqCst);
        let host = headers
            .get("host")
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        (
            StatusCode::ACCEPTED,
            [("Azure-AsyncOperation", format!("http://{host}/operations/op-1"))],
            "",
        )
    }

    async fn get_account(State(counters): State<Shared>) -> impl IntoResponse {
        let n = counters.gets.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            return (StatusCode::TOO_MANY_REQUESTS, [("Retry-After", "0")], Json(json!({}))).into_response();
        }
        Json(json!({"name": "acc", "properties": {"provisioningState": "Succeeded"}})).into_response()
    }

    async fn operation_status(State(counters): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
        if headers.get("authorization").is_none() {
            return (StatusCode::UNAUTHORIZED, Json(json!({"code": "AuthenticationFailed", "message": "no token"})))
                .into_response();
        }
        let n = counters.polls.fetch_add(1, Ordering::SeqCst);
        let status = if n < 2 { "Running" } else { "Succeeded" };
        Json(json!({"id": "op-1", "status": status, "startTime": "2024-05-01T10:00:00Z"})).into_response()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn put_follows_operation_to_completion() {
        let counters: Shared = Arc::default();
        let router = Router::new()
            .route("/subscriptions/s1/accounts/acc", get(get_account).put(put_account))
            .route("/operations/op-1", get(operation_status))
            .with_state(counters.clone());
        let (server, addr) = spawn_axum(router).await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let client = ResourceProviderClient::new(
            format!("http://{addr}"),
            Arc::new(transport),
            Arc::new(StaticTokenProvider(CredentialHeader::bearer("e2e"))),
        )
        .with_poller(OperationPoller::new(Duration::from_millis(20), Some(Duration::from_secs(10))));

        let body: Value = client
            .put(
                "/subscriptions/s1/accounts/acc",
                API_VERSION,
                &json!({"location": "westus"}),
                RequestOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(body["properties"]["provisioningState"], "Succeeded");
        assert_eq!(counters.puts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.polls.load(Ordering::SeqCst), 3);
        // one throttled GET, one served
        assert_eq!(counters.gets.load(Ordering::SeqCst), 2);

        server.abort();
    }
}
