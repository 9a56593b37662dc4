//! # TaskHub Worker
//!
//! Runs the deadline notifier against the shared database: every interval
//! it mails the assignees of open tasks due within the warning window.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/taskhub cargo run -p taskhub-worker
//! ```

use std::sync::Arc;
use taskhub_shared::clock::SystemClock;
use taskhub_shared::db::pool::create_pool;
use taskhub_shared::mailer::build_mailer;
use taskhub_shared::services::NotificationService;
use taskhub_shared::store::PgStore;
use taskhub_worker::config::WorkerConfig;
use taskhub_worker::notifier::DeadlineNotifier;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhub_worker=debug,taskhub_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("TaskHub Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;

    // Migrations belong to the API server
    let pool = create_pool(&config.database).await?;
    let notifications = NotificationService::new(
        Arc::new(PgStore::new(pool)),
        build_mailer(&config.mailer)?,
        Arc::new(SystemClock),
    );

    let notifier = DeadlineNotifier::new(notifications, config.notifier);

    let shutdown = notifier.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
        shutdown.cancel();
    });

    notifier.run().await
}
