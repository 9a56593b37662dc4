//! # TaskHub API Server
//!
//! Serves the TaskHub REST API.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/taskhub JWT_SECRET=... cargo run -p taskhub-api
//! ```
//!
//! Set `DATABASE_URL=memory` to run against the in-memory store.

use std::sync::Arc;
use taskhub_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskhub_shared::clock::SystemClock;
use taskhub_shared::db::{migrations::run_migrations, pool::create_pool};
use taskhub_shared::mailer::build_mailer;
use taskhub_shared::store::{MemoryStore, PgStore, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhub_api=debug,taskhub_shared=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("TaskHub API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = if config.uses_memory_store() {
        tracing::warn!("Using in-memory store; data is lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = create_pool(&config.database).await?;
        run_migrations(&pool).await?;
        Arc::new(PgStore::new(pool))
    };

    let mailer = build_mailer(&config.mailer)?;
    let bind_address = config.bind_address();

    let state = AppState::new(store, mailer, Arc::new(SystemClock), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
