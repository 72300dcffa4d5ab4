//! # Othello API Server
//!
//! Serves the account RPCs over HTTP/JSON on port 50052 by default.
//!
//! Startup: load configuration, open the database pool, apply migrations,
//! record the server start, then serve until Ctrl-C.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://othello@localhost/othello cargo run -p othello-api
//! ```

use othello_api::{
    app::{build_router, AppState},
    config::Config,
};
use othello_shared::{
    db::{
        migrations::{record_server_start, run_migrations},
        pool::{close_pool, create_pool},
    },
    service::AccountService,
    store::postgres::PgStore,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env may set RUST_LOG and LOG_FORMAT
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "Othello API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(config.pool_config()).await?;
    run_migrations(&pool).await?;
    record_server_start(&pool).await?;

    let accounts = AccountService::new(Arc::new(PgStore::new(pool.clone())))
        .with_default_deadline(config.request_timeout());
    let app = build_router(AppState::new(accounts));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Installs the global subscriber; `LOG_FORMAT=json` switches to JSON lines
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "othello=info,othello_api=debug,othello_shared=info,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
