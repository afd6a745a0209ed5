use crate::error::{MirrorError, MirrorResult};
use crate::net::{Network, NetworkClient};
use crate::store::LinkedAccount;
use async_trait::async_trait;
use reqwest::StatusCode;

const POSTS_URL: &str = "https://alpha-api.app.net/stream/0/posts";

/// App.net client authenticating with the user's bearer token
pub struct AppNetClient {
    http: reqwest::Client,
    access_token: String,
}

impl AppNetClient {
    pub fn new(http: reqwest::Client, account: &LinkedAccount) -> Self {
        Self {
            http,
            access_token: account.access_token.clone(),
        }
    }
}

#[async_trait]
impl NetworkClient for AppNetClient {
    fn network(&self) -> Network {
        Network::AppNet
    }

    async fn post_status(&self, text: &str) -> MirrorResult<()> {
        let response = self
            .http
            .post(POSTS_URL)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(MirrorError::AuthRevoked);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MirrorError::Network(format!(
                "app.net returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}
