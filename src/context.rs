use crate::{
    cache::MediaCache,
    config::AppConfig,
    db,
    dispatch::Dispatcher,
    error::MirrorResult,
    feed::{PlusFeed, SourceFeed},
    format::FormatterSet,
    net::{ClientFactory, HttpClientFactory},
    store::{SqliteUserStore, UserStore},
    sync::SyncOrchestrator,
};
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub user_store: Arc<dyn UserStore>,
    pub media_cache: Arc<MediaCache>,
    pub orchestrator: Arc<SyncOrchestrator>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: AppConfig) -> MirrorResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directory if it doesn't exist
        if !config.storage.data_directory.exists() {
            tokio::fs::create_dir_all(&config.storage.data_directory).await?;
        }

        // Initialize user database
        let user_db = db::create_pool(&config.storage.user_db, db::DatabaseOptions::default()).await?;
        db::run_migrations(&user_db).await?;
        db::test_connection(&user_db).await?;

        let config = Arc::new(config);

        let user_store: Arc<dyn UserStore> = Arc::new(SqliteUserStore::new(user_db.clone()));

        // Shared media byte cache for photo posts
        let media_cache = Arc::new(MediaCache::new(
            config.media_cache.clone(),
            &config.http,
        )?);

        // Per-network clients and formatters behind the dispatcher
        let factory: Arc<dyn ClientFactory> = Arc::new(HttpClientFactory::new(Arc::clone(&config))?);
        let formatters = FormatterSet::new(Arc::clone(&media_cache));
        let dispatcher = Arc::new(Dispatcher::new(
            factory,
            formatters,
            Arc::clone(&user_store),
        ));

        // Source feed and the orchestrator driving the whole pipeline
        let feed: Arc<dyn SourceFeed> = Arc::new(PlusFeed::new(Arc::clone(&config))?);
        let orchestrator = Arc::new(SyncOrchestrator::new(
            Arc::clone(&user_store),
            feed,
            Arc::clone(&dispatcher),
            config.sync.max_activities,
        ));

        Ok(Self {
            config,
            user_store,
            media_cache,
            orchestrator,
        })
    }
}
