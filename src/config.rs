use crate::cache::MediaCacheConfig;
use crate::error::{MirrorError, MirrorResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main application configuration
///
/// Built once at startup from environment variables and passed by
/// reference through the application context; no ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
    pub source: SourceConfig,
    pub networks: NetworkKeys,
    pub media_cache: MediaCacheConfig,
    pub logging: LoggingConfig,
}

/// Sync pass configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between sync passes
    pub interval_secs: u64,
    /// Activities fetched per user per pass
    pub max_activities: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub user_db: PathBuf,
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds for every outbound call
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Source stream (Google+) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base: String,
    pub token_url: String,
}

/// Consumer credentials for every target network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkKeys {
    pub twitter: ConsumerKeys,
    pub facebook: ConsumerKeys,
    pub app_net: ConsumerKeys,
}

/// One network's application key pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerKeys {
    pub key: String,
    pub secret: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> MirrorResult<Self> {
        dotenv::dotenv().ok();

        let interval_secs = env::var("MIRROR_SYNC_INTERVAL")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);
        let max_activities = env::var("MIRROR_SYNC_MAX_ACTIVITIES")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let data_directory: PathBuf = env::var("MIRROR_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let user_db = env::var("MIRROR_USER_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("users.sqlite"));

        let timeout_secs = env::var("MIRROR_HTTP_TIMEOUT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let user_agent =
            env::var("MIRROR_USER_AGENT").unwrap_or_else(|_| "Mirrorcast/0.1".to_string());

        let source = SourceConfig {
            client_id: env::var("MIRROR_GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("MIRROR_GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            api_base: env::var("MIRROR_SOURCE_API_BASE")
                .unwrap_or_else(|_| "https://www.googleapis.com/plus/v1".to_string()),
            token_url: env::var("MIRROR_SOURCE_TOKEN_URL")
                .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/token".to_string()),
        };

        let networks = NetworkKeys {
            twitter: ConsumerKeys {
                key: env::var("MIRROR_TWITTER_CONSUMER_KEY").unwrap_or_default(),
                secret: env::var("MIRROR_TWITTER_CONSUMER_SECRET").unwrap_or_default(),
            },
            facebook: ConsumerKeys {
                key: env::var("MIRROR_FACEBOOK_APP_ID").unwrap_or_default(),
                secret: env::var("MIRROR_FACEBOOK_APP_SECRET").unwrap_or_default(),
            },
            app_net: ConsumerKeys {
                key: env::var("MIRROR_ADN_CLIENT_ID").unwrap_or_default(),
                secret: env::var("MIRROR_ADN_CLIENT_SECRET").unwrap_or_default(),
            },
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(AppConfig {
            sync: SyncConfig {
                interval_secs,
                max_activities,
            },
            storage: StorageConfig {
                data_directory,
                user_db,
            },
            http: HttpConfig {
                timeout_secs,
                user_agent,
            },
            source,
            networks,
            media_cache: MediaCacheConfig::from_env(),
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    ///
    /// Every network key pair and the source credentials must be present;
    /// a partially configured service would silently skip networks.
    pub fn validate(&self) -> MirrorResult<()> {
        let required = [
            ("MIRROR_GOOGLE_CLIENT_ID", &self.source.client_id),
            ("MIRROR_GOOGLE_CLIENT_SECRET", &self.source.client_secret),
            ("MIRROR_TWITTER_CONSUMER_KEY", &self.networks.twitter.key),
            (
                "MIRROR_TWITTER_CONSUMER_SECRET",
                &self.networks.twitter.secret,
            ),
            ("MIRROR_FACEBOOK_APP_ID", &self.networks.facebook.key),
            ("MIRROR_FACEBOOK_APP_SECRET", &self.networks.facebook.secret),
            ("MIRROR_ADN_CLIENT_ID", &self.networks.app_net.key),
            ("MIRROR_ADN_CLIENT_SECRET", &self.networks.app_net.secret),
        ];
        for (name, value) in required {
            if value.is_empty() {
                return Err(MirrorError::Validation(format!("{} is required", name)));
            }
        }

        if self.sync.interval_secs == 0 {
            return Err(MirrorError::Validation(
                "sync interval must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
