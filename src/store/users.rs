use crate::error::MirrorResult;
use crate::store::{LinkedAccount, SourceAccount, User, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

/// SQLite-backed user store
#[derive(Clone)]
pub struct SqliteUserStore {
    db: SqlitePool,
}

/// Flat row shape of the `users` table
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: String,
    source_access_token: String,
    source_refresh_token: String,
    source_token_expiry: i64,
    last_synced_at: i64,
    twitter_id: String,
    twitter_screen_name: String,
    twitter_access_token: String,
    twitter_access_secret: String,
    facebook_id: String,
    facebook_screen_name: String,
    facebook_access_token: String,
    facebook_access_secret: String,
    appnet_id: String,
    appnet_screen_name: String,
    appnet_access_token: String,
    appnet_access_secret: String,
    active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            source: SourceAccount {
                access_token: row.source_access_token,
                refresh_token: row.source_refresh_token,
                token_expiry: row.source_token_expiry,
            },
            last_synced_at: row.last_synced_at,
            twitter: LinkedAccount {
                network_id: row.twitter_id,
                screen_name: row.twitter_screen_name,
                access_token: row.twitter_access_token,
                access_secret: row.twitter_access_secret,
            },
            facebook: LinkedAccount {
                network_id: row.facebook_id,
                screen_name: row.facebook_screen_name,
                access_token: row.facebook_access_token,
                access_secret: row.facebook_access_secret,
            },
            app_net: LinkedAccount {
                network_id: row.appnet_id,
                screen_name: row.appnet_screen_name,
                access_token: row.appnet_access_token,
                access_secret: row.appnet_access_secret,
            },
            active: row.active,
        }
    }
}

impl SqliteUserStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get(&self, id: &str) -> MirrorResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(User::from))
    }

    async fn put(&self, user: &mut User) -> MirrorResult<()> {
        let was_active = user.active;
        user.recompute_active();
        if user.active && !was_active {
            // Freshly (re)activated: start mirroring from now, not history
            user.last_synced_at = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        }

        sqlx::query(
            r#"
            INSERT INTO users (
                id,
                source_access_token, source_refresh_token, source_token_expiry,
                last_synced_at,
                twitter_id, twitter_screen_name, twitter_access_token, twitter_access_secret,
                facebook_id, facebook_screen_name, facebook_access_token, facebook_access_secret,
                appnet_id, appnet_screen_name, appnet_access_token, appnet_access_secret,
                active
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                source_access_token = excluded.source_access_token,
                source_refresh_token = excluded.source_refresh_token,
                source_token_expiry = excluded.source_token_expiry,
                last_synced_at = excluded.last_synced_at,
                twitter_id = excluded.twitter_id,
                twitter_screen_name = excluded.twitter_screen_name,
                twitter_access_token = excluded.twitter_access_token,
                twitter_access_secret = excluded.twitter_access_secret,
                facebook_id = excluded.facebook_id,
                facebook_screen_name = excluded.facebook_screen_name,
                facebook_access_token = excluded.facebook_access_token,
                facebook_access_secret = excluded.facebook_access_secret,
                appnet_id = excluded.appnet_id,
                appnet_screen_name = excluded.appnet_screen_name,
                appnet_access_token = excluded.appnet_access_token,
                appnet_access_secret = excluded.appnet_access_secret,
                active = excluded.active
            "#,
        )
        .bind(&user.id)
        .bind(&user.source.access_token)
        .bind(&user.source.refresh_token)
        .bind(user.source.token_expiry)
        .bind(user.last_synced_at)
        .bind(&user.twitter.network_id)
        .bind(&user.twitter.screen_name)
        .bind(&user.twitter.access_token)
        .bind(&user.twitter.access_secret)
        .bind(&user.facebook.network_id)
        .bind(&user.facebook.screen_name)
        .bind(&user.facebook.access_token)
        .bind(&user.facebook.access_secret)
        .bind(&user.app_net.network_id)
        .bind(&user.app_net.screen_name)
        .bind(&user.app_net.access_token)
        .bind(&user.app_net.access_secret)
        .bind(user.active)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list_active(&self) -> MirrorResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users WHERE active = 1")
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_store() -> SqliteUserStore {
        let db = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        SqliteUserStore::new(db)
    }

    fn linked(id: &str) -> LinkedAccount {
        LinkedAccount {
            network_id: id.to_string(),
            screen_name: "name".to_string(),
            access_token: "token".to_string(),
            access_secret: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let store = create_test_store().await;

        let mut user = User {
            id: "g-1".to_string(),
            source: SourceAccount {
                access_token: "at".to_string(),
                refresh_token: "rt".to_string(),
                token_expiry: 42,
            },
            twitter: linked("tw-1"),
            ..User::default()
        };
        store.put(&mut user).await.unwrap();

        let loaded = store.get("g-1").await.unwrap().unwrap();
        assert_eq!(loaded, user);
        assert!(loaded.active);
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let store = create_test_store().await;
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_activation_bumps_watermark() {
        let store = create_test_store().await;

        let mut user = User {
            id: "g-2".to_string(),
            ..User::default()
        };
        store.put(&mut user).await.unwrap();
        assert_eq!(user.last_synced_at, 0);

        user.twitter = linked("tw-2");
        store.put(&mut user).await.unwrap();
        assert!(user.active);
        assert!(user.last_synced_at > 0);

        // Already active: the watermark is left alone
        let watermark = user.last_synced_at;
        user.facebook = linked("fb-2");
        store.put(&mut user).await.unwrap();
        assert_eq!(user.last_synced_at, watermark);
    }

    #[tokio::test]
    async fn test_unlinking_last_network_deactivates() {
        let store = create_test_store().await;

        let mut user = User {
            id: "g-3".to_string(),
            app_net: linked("adn-3"),
            ..User::default()
        };
        store.put(&mut user).await.unwrap();
        assert!(user.active);

        user.app_net.clear();
        store.put(&mut user).await.unwrap();
        assert!(!user.active);
        assert!(store.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_active_filters_inactive() {
        let store = create_test_store().await;

        let mut active = User {
            id: "g-4".to_string(),
            twitter: linked("tw-4"),
            ..User::default()
        };
        let mut inactive = User {
            id: "g-5".to_string(),
            ..User::default()
        };
        store.put(&mut active).await.unwrap();
        store.put(&mut inactive).await.unwrap();

        let listed = store.list_active().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "g-4");
    }

}
