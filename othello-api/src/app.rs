/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use othello_api::app::{build_router, AppState};
/// use othello_shared::service::AccountService;
/// use othello_shared::store::memory::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let service = AccountService::new(Arc::new(MemoryStore::new()));
/// let app = build_router(AppState::new(service));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:50052").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use axum::{
    routing::{get, post},
    Router,
};
use othello_shared::service::AccountService;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor; the service
/// holds its store behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Account lifecycle service
    pub accounts: AccountService,
}

impl AppState {
    /// Creates new application state
    pub fn new(accounts: AccountService) -> Self {
        Self { accounts }
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── GET  /health
/// └── POST /rpc/
///     ├── CreateAccount
///     ├── Authenticate
///     ├── Login              # alias of Authenticate
///     ├── DeleteAccount
///     └── :method            # 501 for declared game methods, 404 otherwise
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let rpc_routes = Router::new()
        .route("/CreateAccount", post(routes::accounts::create_account))
        .route("/Authenticate", post(routes::accounts::authenticate))
        .route("/Login", post(routes::accounts::authenticate))
        .route("/DeleteAccount", post(routes::accounts::delete_account))
        .route("/:method", post(routes::games::dispatch));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/rpc", rpc_routes)
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state)
}
