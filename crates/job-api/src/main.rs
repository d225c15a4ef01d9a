//! jobgate: HTTP front end for process handlers and the batch scheduler.

use job_api::config::ServerConfig;
use job_api::server::{self, AppState};
use job_registry::SqliteJobRegistry;
use job_scheduler::{BatchScheduler, SgeScheduler};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tokio::fs::create_dir_all(&config.base_dir).await?;
    let registry = Arc::new(SqliteJobRegistry::new(config.base_dir.join("jobs.sqlite"))?);
    let scheduler: Arc<dyn BatchScheduler> =
        Arc::new(SgeScheduler::new(config.scheduler.clone()));
    let processes = config.catalog(scheduler)?;
    tracing::info!(processes = ?processes.keys().collect::<Vec<_>>(), "processes configured");

    let state = Arc::new(AppState {
        processes,
        registry,
        base_dir: config.base_dir.clone(),
        public_url: config.public_url.clone(),
        max_body: config.max_body,
    });
    let app = server::router(state);
    tracing::info!("jobgate listening on {}", config.listen);
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
