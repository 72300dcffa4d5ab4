/// Common test utilities for integration tests
///
/// Builds the full router over an in-memory store so RPCs can be driven
/// end to end without a database.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use othello_api::app::{build_router, AppState};
use othello_shared::service::AccountService;
use othello_shared::store::memory::MemoryStore;
use serde_json::Value;
use std::sync::Arc;
use tower::Service as _;

/// Test context containing the app and its backing store
pub struct TestContext {
    pub store: MemoryStore,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a context with an empty store
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let accounts = AccountService::new(Arc::new(store.clone()));
        let app = build_router(AppState::new(accounts));

        TestContext { store, app }
    }

    /// Calls `POST /rpc/<method>` with a JSON body
    pub async fn rpc(&self, method: &str, body: Value) -> (StatusCode, Value) {
        self.rpc_with_headers(method, body, &[]).await
    }

    /// Calls `POST /rpc/<method>` with extra headers
    pub async fn rpc_with_headers(
        &self,
        method: &str,
        body: Value,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/rpc/{}", method))
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        self.send(request).await
    }

    /// Sends an arbitrary request and decodes the JSON response
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&body).into_owned())
            })
        };

        (status, value)
    }

    /// Creates an account through the RPC and returns its session token
    pub async fn create_account(&self, name: &str, password: &str) -> i64 {
        let (status, body) = self
            .rpc(
                "CreateAccount",
                serde_json::json!({
                    "name": name,
                    "email": format!("{}@example.com", name.to_lowercase()),
                    "phone": "+1 650 555 1212",
                    "password": password,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "CreateAccount failed: {}", body);

        body["session_token"].as_i64().unwrap()
    }
}
