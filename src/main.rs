/// Mirrorcast - mirrors a source activity stream to linked social networks
///
/// Watches each active user's activity stream and re-posts anything new to
/// the Twitter, Facebook and App.net accounts the user has linked.
mod activity;
mod cache;
mod config;
mod context;
mod db;
mod dispatch;
mod error;
mod feed;
mod format;
mod jobs;
mod net;
mod store;
mod sync;

use config::AppConfig;
use context::AppContext;
use error::MirrorResult;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> MirrorResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirrorcast=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create application context
    let ctx = Arc::new(AppContext::new(config).await?);
    let active_users = ctx.user_store.list_active().await?.len();
    info!(
        interval = ctx.config.sync.interval_secs,
        active_users, "mirrorcast starting"
    );

    // Start background jobs (the sync loop does the actual mirroring)
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    Ok(())
}
