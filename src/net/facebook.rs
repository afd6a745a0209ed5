use crate::error::{MirrorError, MirrorResult};
use crate::net::{LinkPost, MediaPost, Network, NetworkClient};
use crate::store::LinkedAccount;
use async_trait::async_trait;
use serde::Deserialize;

const GRAPH_API_URL: &str = "https://graph.facebook.com";

/// Facebook Graph API client authenticating with the user's access token
pub struct FacebookClient {
    http: reqwest::Client,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GraphError {
    message: String,
    #[serde(rename = "type")]
    kind: String,
}

impl FacebookClient {
    pub fn new(http: reqwest::Client, account: &LinkedAccount) -> Self {
        Self {
            http,
            access_token: account.access_token.clone(),
        }
    }

    async fn call(&self, endpoint: &str, params: &[(&str, &str)]) -> MirrorResult<()> {
        let url = format!("{}/{}", GRAPH_API_URL, endpoint);
        let response = self
            .http
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .form(params)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(parse_graph_error(&body))
    }
}

/// Graph error bodies carry a type tag; "OAuthException" means the user
/// deauthorized the application upstream.
fn parse_graph_error(body: &str) -> MirrorError {
    match serde_json::from_str::<GraphErrorBody>(body) {
        Ok(GraphErrorBody { error: Some(error) }) if error.kind == "OAuthException" => {
            MirrorError::AuthRevoked
        }
        Ok(GraphErrorBody { error: Some(error) }) => {
            MirrorError::Network(format!("facebook error: {}", error.message))
        }
        _ => MirrorError::Network(format!("facebook error: {}", body)),
    }
}

#[async_trait]
impl NetworkClient for FacebookClient {
    fn network(&self) -> Network {
        Network::Facebook
    }

    async fn post_status(&self, text: &str) -> MirrorResult<()> {
        self.call("me/feed", &[("message", text)]).await
    }

    async fn post_link(&self, link: &LinkPost) -> MirrorResult<()> {
        let mut params = vec![("message", link.text.as_str()), ("link", link.url.as_str())];
        if let Some(image) = &link.image {
            params.push(("picture", image.as_str()));
        }
        self.call("me/feed", &params).await
    }

    async fn post_media(&self, media: &MediaPost) -> MirrorResult<()> {
        let url = format!("{}/me/photos", GRAPH_API_URL);
        let part = reqwest::multipart::Part::bytes(media.data.clone())
            .file_name(media.filename.clone());
        let form = reqwest::multipart::Form::new()
            .text("message", media.text.clone())
            .part("source", part);

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .multipart(form)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(parse_graph_error(&body))
    }
}
