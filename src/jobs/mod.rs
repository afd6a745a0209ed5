use crate::context::AppContext;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

/// Seconds between media cache prune runs
const CACHE_PRUNE_INTERVAL_SECS: u64 = 900;

/// Background job scheduler
///
/// The sync loop is what the service exists for; the cache prune keeps the
/// media cache from accumulating stale downloads.
pub struct JobScheduler {
    context: Arc<AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("starting background jobs");

        tokio::spawn(Self::sync_job(Arc::clone(&self)));
        tokio::spawn(Self::media_cache_prune_job(Arc::clone(&self)));

        info!("background jobs started");
    }

    /// Periodic mirroring pass over all active users
    async fn sync_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(
            scheduler.context.config.sync.interval_secs,
        ));

        loop {
            interval.tick().await;
            debug!("running sync pass");
            scheduler.context.orchestrator.sync_all().await;
        }
    }

    /// Drop expired media cache entries
    async fn media_cache_prune_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(CACHE_PRUNE_INTERVAL_SECS));

        loop {
            interval.tick().await;

            let removed = scheduler.context.media_cache.prune_expired();
            if removed > 0 {
                info!(
                    "pruned {} expired media cache entries, {} remain",
                    removed,
                    scheduler.context.media_cache.len()
                );
            }
        }
    }
}
