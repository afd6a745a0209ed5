use crate::config::HttpConfig;
use crate::error::{MirrorError, MirrorResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Media cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCacheConfig {
    /// Seconds a fetched media entry stays usable
    pub ttl_secs: u64,
    /// Entry cap; the stalest entry is evicted when full
    pub max_entries: usize,
}

impl Default for MediaCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_entries: 256,
        }
    }
}

impl MediaCacheConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self {
            ttl_secs: std::env::var("MIRROR_MEDIA_CACHE_TTL")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600),
            max_entries: std::env::var("MIRROR_MEDIA_CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| "256".to_string())
                .parse()
                .unwrap_or(256),
        }
    }
}

struct CacheEntry {
    data: Arc<Vec<u8>>,
    stored_at: Instant,
}

/// Byte cache for downloaded media, keyed by source URL.
///
/// `get_or_fetch` is the single populate-or-read path: concurrent misses
/// for the same key coalesce behind a per-key gate so each URL is fetched
/// at most once at a time.
pub struct MediaCache {
    http: reqwest::Client,
    config: MediaCacheConfig,
    entries: Mutex<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl MediaCache {
    pub fn new(config: MediaCacheConfig, http_config: &HttpConfig) -> MirrorResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&http_config.user_agent)
            .timeout(Duration::from_secs(http_config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            config,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// Download a URL through the cache
    pub async fn fetch_url(&self, url: &str) -> MirrorResult<Arc<Vec<u8>>> {
        let http = self.http.clone();
        let target = url.to_string();
        self.get_or_fetch(url, || async move {
            debug!("downloading media from {}", target);
            let response = http.get(&target).send().await?;
            if !response.status().is_success() {
                return Err(MirrorError::Network(format!(
                    "media download from {} returned {}",
                    target,
                    response.status()
                )));
            }
            Ok(response.bytes().await?.to_vec())
        })
        .await
    }

    /// Return the cached bytes for `key`, running `fetch` on a miss.
    /// Fetch failures are not cached.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> MirrorResult<Arc<Vec<u8>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MirrorResult<Vec<u8>>>,
    {
        if let Some(data) = self.lookup(key) {
            debug!("media cache HIT: {}", key);
            return Ok(data);
        }

        let gate = self.gate(key);
        let _guard = gate.lock().await;

        // Someone else may have populated the entry while we waited
        if let Some(data) = self.lookup(key) {
            debug!("media cache HIT after wait: {}", key);
            return Ok(data);
        }

        debug!("media cache MISS: {}", key);
        let data = match fetch().await {
            Ok(bytes) => Arc::new(bytes),
            Err(err) => {
                self.release_gate(key);
                return Err(err);
            }
        };

        // Insert before releasing the gate so late arrivals cannot slip
        // between the two and refetch
        self.insert(key, Arc::clone(&data));
        self.release_gate(key);
        Ok(data)
    }

    /// Drop entries older than the TTL; returns how many were removed
    pub fn prune_expired(&self) -> usize {
        let ttl = Duration::from_secs(self.config.ttl_secs);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        before - entries.len()
    }

    /// Number of live cache entries
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        let ttl = Duration::from_secs(self.config.ttl_secs);
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < ttl)
            .map(|entry| Arc::clone(&entry.data))
    }

    fn insert(&self, key: &str, data: Arc<Vec<u8>>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() >= self.config.max_entries && !entries.contains_key(key) {
            // At capacity: make room by dropping the stalest entry
            if let Some(stalest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone())
            {
                entries.remove(&stalest);
            }
        }
        entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                stored_at: Instant::now(),
            },
        );
    }

    fn gate(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    fn release_gate(&self, key: &str) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(key);
    }
}
