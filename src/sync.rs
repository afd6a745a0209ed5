use crate::activity::published_nanos;
use crate::dispatch::Dispatcher;
use crate::error::MirrorResult;
use crate::feed::SourceFeed;
use crate::store::{User, UserStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Drives one full mirroring pass over every active user.
///
/// Users are processed sequentially, each under a per-user lock so that
/// overlapping passes can never fan the same activity out twice.
pub struct SyncOrchestrator {
    store: Arc<dyn UserStore>,
    feed: Arc<dyn SourceFeed>,
    dispatcher: Arc<Dispatcher>,
    locks: UserLocks,
    max_activities: usize,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn UserStore>,
        feed: Arc<dyn SourceFeed>,
        dispatcher: Arc<Dispatcher>,
        max_activities: usize,
    ) -> Self {
        Self {
            store,
            feed,
            dispatcher,
            locks: UserLocks::new(),
            max_activities,
        }
    }

    /// Sync every active user. A failing user aborts only their own sync;
    /// their watermark is left untouched so the next pass retries the same
    /// window.
    pub async fn sync_all(&self) {
        let users = match self.store.list_active().await {
            Ok(users) => users,
            Err(err) => {
                error!(error = %err, "failed to enumerate active users");
                return;
            }
        };
        info!(users = users.len(), "starting sync pass");

        for listed in users {
            let _guard = self.locks.acquire(&listed.id).await;

            // The listing snapshot may be stale by the time the lock is
            // ours; re-read the record it is about to mutate
            let mut user = match self.store.get(&listed.id).await {
                Ok(Some(user)) if user.active => user,
                Ok(_) => continue,
                Err(err) => {
                    warn!(user = %listed.id, error = %err, "failed to reload user");
                    continue;
                }
            };

            if let Err(err) = self.sync_user(&mut user).await {
                warn!(user = %user.id, error = %err, "sync failed for user");
            }
        }
    }

    /// Mirror one user's recent activities.
    ///
    /// The watermark only ever moves forward and is committed after the
    /// whole batch: a crash mid-batch re-delivers the same window on the
    /// next pass (duplicates are visible and correctable, dropped posts
    /// are not).
    async fn sync_user(&self, user: &mut User) -> MirrorResult<()> {
        debug!(user = %user.id, watermark = user.last_synced_at, "fetching activities");
        let page = self.feed.list_activities(user, self.max_activities).await?;

        let mut latest = user.last_synced_at;
        for activity in &page.activities {
            let Some(published) = published_nanos(activity) else {
                warn!(user = %user.id, activity = %activity.id, "skipping activity with unparsable publish time");
                continue;
            };

            if published > user.last_synced_at {
                self.dispatcher.publish(user, activity).await;
            }
            if published > latest {
                latest = published;
            }
        }

        if latest > user.last_synced_at || page.credential != user.source {
            user.last_synced_at = latest;
            user.source = page.credential;
            self.store.put(user).await?;
        }

        Ok(())
    }
}

/// Per-user mutual exclusion, keyed by user id
pub struct UserLocks {
    inner: tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self {
            inner: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, id: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().await;
            Arc::clone(
                locks
                    .entry(id.to_string())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}

impl Default for UserLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Activity, ActivityObject};
    use crate::cache::{MediaCache, MediaCacheConfig};
    use crate::config::HttpConfig;
    use crate::error::MirrorError;
    use crate::feed::FeedPage;
    use crate::format::FormatterSet;
    use crate::net::{ClientFactory, LinkPost, MediaPost, Network, NetworkClient};
    use crate::store::{LinkedAccount, SourceAccount};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Feed stub returning a fixed page (or an error)
    struct StubFeed {
        page: MirrorResult<FeedPage>,
    }

    #[async_trait]
    impl SourceFeed for StubFeed {
        async fn list_activities(
            &self,
            _user: &User,
            _max_results: usize,
        ) -> MirrorResult<FeedPage> {
            match &self.page {
                Ok(page) => Ok(page.clone()),
                Err(_) => Err(MirrorError::Network("feed unavailable".to_string())),
            }
        }
    }

    /// Network stub that counts accepted posts
    struct CountingFactory {
        posts: Arc<AtomicUsize>,
    }

    struct CountingClient {
        network: Network,
        posts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl NetworkClient for CountingClient {
        fn network(&self) -> Network {
            self.network
        }

        async fn post_status(&self, _text: &str) -> MirrorResult<()> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn post_link(&self, _link: &LinkPost) -> MirrorResult<()> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn post_media(&self, _media: &MediaPost) -> MirrorResult<()> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl ClientFactory for CountingFactory {
        fn client(&self, network: Network, _account: &LinkedAccount) -> Arc<dyn NetworkClient> {
            Arc::new(CountingClient {
                network,
                posts: Arc::clone(&self.posts),
            })
        }
    }

    /// Store stub with one user and a record of every put
    struct OneUserStore {
        user: User,
        saved: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserStore for OneUserStore {
        async fn get(&self, id: &str) -> MirrorResult<Option<User>> {
            Ok((self.user.id == id).then(|| self.user.clone()))
        }

        async fn put(&self, user: &mut User) -> MirrorResult<()> {
            user.recompute_active();
            self.saved.lock().unwrap().push(user.clone());
            Ok(())
        }

        async fn list_active(&self) -> MirrorResult<Vec<User>> {
            Ok(vec![self.user.clone()])
        }
    }

    fn activity_at(id: &str, published: &str) -> Activity {
        Activity {
            id: id.to_string(),
            verb: "post".to_string(),
            url: format!("http://plus.example/{}", id),
            published: published.to_string(),
            object: Some(ActivityObject {
                content: format!("content of {}", id),
                url: format!("http://plus.example/obj/{}", id),
                ..ActivityObject::default()
            }),
            ..Activity::default()
        }
    }

    fn twitter_user(watermark: i64) -> User {
        let mut user = User {
            id: "u-1".to_string(),
            source: SourceAccount {
                access_token: "at".to_string(),
                refresh_token: "rt".to_string(),
                token_expiry: i64::MAX,
            },
            last_synced_at: watermark,
            twitter: LinkedAccount {
                network_id: "tw".to_string(),
                screen_name: "name".to_string(),
                access_token: "token".to_string(),
                access_secret: "secret".to_string(),
            },
            ..User::default()
        };
        user.recompute_active();
        user
    }

    fn build_orchestrator(
        user: User,
        page: MirrorResult<FeedPage>,
    ) -> (SyncOrchestrator, Arc<OneUserStore>, Arc<AtomicUsize>) {
        let store = Arc::new(OneUserStore {
            user,
            saved: Mutex::new(vec![]),
        });
        let posts = Arc::new(AtomicUsize::new(0));
        let cache = MediaCache::new(
            MediaCacheConfig::default(),
            &HttpConfig {
                timeout_secs: 5,
                user_agent: "test".to_string(),
            },
        )
        .unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(CountingFactory {
                posts: Arc::clone(&posts),
            }),
            FormatterSet::new(Arc::new(cache)),
            Arc::clone(&store) as Arc<dyn UserStore>,
        ));
        let orchestrator = SyncOrchestrator::new(
            Arc::clone(&store) as Arc<dyn UserStore>,
            Arc::new(StubFeed { page }),
            dispatcher,
            5,
        );
        (orchestrator, store, posts)
    }

    // Publish time of "1970-01-01T00:00:0{n}Z" in nanos
    const SECOND: i64 = 1_000_000_000;

    #[tokio::test]
    async fn test_only_activities_newer_than_watermark_are_published() {
        let user = twitter_user(2 * SECOND);
        let page = FeedPage {
            activities: vec![
                activity_at("new", "1970-01-01T00:00:04Z"),
                activity_at("old", "1970-01-01T00:00:01Z"),
            ],
            credential: user.source.clone(),
        };
        let (orchestrator, store, posts) = build_orchestrator(user, Ok(page));

        orchestrator.sync_all().await;

        assert_eq!(posts.load(Ordering::SeqCst), 1);
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].last_synced_at, 4 * SECOND);
    }

    #[tokio::test]
    async fn test_watermark_never_regresses() {
        let user = twitter_user(10 * SECOND);
        let page = FeedPage {
            activities: vec![activity_at("older", "1970-01-01T00:00:03Z")],
            credential: user.source.clone(),
        };
        let (orchestrator, store, posts) = build_orchestrator(user, Ok(page));

        orchestrator.sync_all().await;

        // Nothing newer: no posts, no persistence, watermark untouched
        assert_eq!(posts.load(Ordering::SeqCst), 0);
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_timestamps_skip_activity_but_not_batch() {
        let user = twitter_user(0);
        let page = FeedPage {
            activities: vec![
                activity_at("bad", "not-a-timestamp"),
                activity_at("good", "1970-01-01T00:00:05Z"),
            ],
            credential: user.source.clone(),
        };
        let (orchestrator, store, posts) = build_orchestrator(user, Ok(page));

        orchestrator.sync_all().await;

        assert_eq!(posts.load(Ordering::SeqCst), 1);
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.last().unwrap().last_synced_at, 5 * SECOND);
    }

    #[tokio::test]
    async fn test_feed_failure_leaves_watermark_untouched() {
        let user = twitter_user(7 * SECOND);
        let (orchestrator, store, posts) =
            build_orchestrator(user, Err(MirrorError::Network("down".to_string())));

        orchestrator.sync_all().await;

        assert_eq!(posts.load(Ordering::SeqCst), 0);
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refreshed_credential_is_persisted_without_new_activity() {
        let user = twitter_user(9 * SECOND);
        let refreshed = SourceAccount {
            access_token: "fresh".to_string(),
            refresh_token: "rt".to_string(),
            token_expiry: i64::MAX,
        };
        let page = FeedPage {
            activities: vec![],
            credential: refreshed.clone(),
        };
        let (orchestrator, store, _posts) = build_orchestrator(user, Ok(page));

        orchestrator.sync_all().await;

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].source, refreshed);
        assert_eq!(saved[0].last_synced_at, 9 * SECOND);
    }

    #[tokio::test]
    async fn test_user_locks_are_exclusive_per_user() {
        let locks = Arc::new(UserLocks::new());

        let first = locks.acquire("u-1").await;
        // A different user is not blocked
        let _other = locks.acquire("u-2").await;

        let contended = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("u-1").await;
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!contended.is_finished());

        drop(first);
        contended.await.unwrap();
    }
}
