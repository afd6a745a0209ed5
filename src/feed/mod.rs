use crate::activity::{Activity, ActivityFeed};
use crate::config::AppConfig;
use crate::error::{MirrorError, MirrorResult};
use crate::store::{SourceAccount, User};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Refresh this long before the stored expiry, in nanoseconds
const EXPIRY_MARGIN_NANOS: i64 = 60 * 1_000_000_000;

/// One page of a user's source stream, most recent first, together with
/// the credential that was actually used (it may have been refreshed)
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub activities: Vec<Activity>,
    pub credential: SourceAccount,
}

/// Source feed collaborator
#[async_trait]
pub trait SourceFeed: Send + Sync {
    /// Fetch up to `max_results` of the user's most recent public
    /// activities
    async fn list_activities(&self, user: &User, max_results: usize) -> MirrorResult<FeedPage>;
}

/// Google+ REST feed
pub struct PlusFeed {
    http: reqwest::Client,
    config: Arc<AppConfig>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

impl PlusFeed {
    pub fn new(config: Arc<AppConfig>) -> MirrorResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    /// Exchange the refresh token for a fresh access token when the stored
    /// one is about to expire. Without a refresh token the stale credential
    /// is used as-is and the feed call itself reports the failure.
    async fn ensure_fresh(&self, source: &SourceAccount) -> MirrorResult<SourceAccount> {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        if source.token_expiry > now + EXPIRY_MARGIN_NANOS || source.refresh_token.is_empty() {
            return Ok(source.clone());
        }

        debug!("refreshing source access token");
        let response = self
            .http
            .post(&self.config.source.token_url)
            .form(&[
                ("client_id", self.config.source.client_id.as_str()),
                ("client_secret", self.config.source.client_secret.as_str()),
                ("refresh_token", source.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MirrorError::Network(format!(
                "source token refresh returned {}",
                response.status()
            )));
        }
        let token: TokenResponse = response.json().await?;

        Ok(SourceAccount {
            access_token: token.access_token,
            refresh_token: source.refresh_token.clone(),
            token_expiry: now + token.expires_in.saturating_mul(1_000_000_000),
        })
    }
}

#[async_trait]
impl SourceFeed for PlusFeed {
    async fn list_activities(&self, user: &User, max_results: usize) -> MirrorResult<FeedPage> {
        let credential = self.ensure_fresh(&user.source).await?;

        let url = format!(
            "{}/people/{}/activities/public",
            self.config.source.api_base, user.id
        );
        let response = self
            .http
            .get(&url)
            .query(&[("maxResults", max_results.to_string())])
            .bearer_auth(&credential.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MirrorError::Network(format!(
                "activity feed for {} returned {}",
                user.id,
                response.status()
            )));
        }
        let feed: ActivityFeed = response.json().await?;

        Ok(FeedPage {
            activities: feed.items,
            credential,
        })
    }
}
