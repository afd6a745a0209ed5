use crate::config::ConsumerKeys;
use crate::error::{MirrorError, MirrorResult};
use crate::net::oauth1::{self, SigningKeys};
use crate::net::{MediaPost, Network, NetworkClient, ShortenerLimits};
use crate::store::LinkedAccount;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;

const UPDATE_URL: &str = "https://api.twitter.com/1.1/statuses/update.json";
const MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";
const HELP_CONFIGURATION_URL: &str = "https://api.twitter.com/1.1/help/configuration.json";

/// Twitter client signing every request with the user's OAuth1 token pair
pub struct TwitterClient {
    http: reqwest::Client,
    consumer: ConsumerKeys,
    access_token: String,
    access_secret: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Debug, Deserialize)]
struct HelpConfiguration {
    short_url_length: usize,
    short_url_length_https: usize,
    characters_reserved_per_media: usize,
}

impl TwitterClient {
    pub fn new(http: reqwest::Client, consumer: ConsumerKeys, account: &LinkedAccount) -> Self {
        Self {
            http,
            consumer,
            access_token: account.access_token.clone(),
            access_secret: account.access_secret.clone(),
        }
    }

    fn keys(&self) -> SigningKeys {
        SigningKeys {
            consumer_key: self.consumer.key.clone(),
            consumer_secret: self.consumer.secret.clone(),
            token: self.access_token.clone(),
            token_secret: self.access_secret.clone(),
        }
    }

    async fn signed_post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> MirrorResult<reqwest::Response> {
        let header = oauth1::authorization_header("POST", url, params, &self.keys());
        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, header)
            .form(params)
            .send()
            .await?;
        check_response(response).await
    }

    async fn signed_get(&self, url: &str) -> MirrorResult<reqwest::Response> {
        let header = oauth1::authorization_header("GET", url, &[], &self.keys());
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, header)
            .send()
            .await?;
        check_response(response).await
    }
}

/// Map a Twitter response onto the error taxonomy: 401 means our token was
/// revoked upstream, anything else non-2xx is a transient network failure.
async fn check_response(response: reqwest::Response) -> MirrorResult<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(MirrorError::AuthRevoked);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MirrorError::Network(format!(
            "twitter returned {}: {}",
            status, body
        )));
    }
    Ok(response)
}

#[async_trait]
impl NetworkClient for TwitterClient {
    fn network(&self) -> Network {
        Network::Twitter
    }

    async fn post_status(&self, text: &str) -> MirrorResult<()> {
        self.signed_post_form(UPDATE_URL, &[("status", text)])
            .await?;
        Ok(())
    }

    async fn post_media(&self, media: &MediaPost) -> MirrorResult<()> {
        // Upload the bytes first, then reference them from a status update.
        // Multipart bodies contribute no parameters to the signature.
        let header = oauth1::authorization_header("POST", MEDIA_UPLOAD_URL, &[], &self.keys());
        let part = reqwest::multipart::Part::bytes(media.data.clone())
            .file_name(media.filename.clone());
        let form = reqwest::multipart::Form::new().part("media", part);

        let response = self
            .http
            .post(MEDIA_UPLOAD_URL)
            .header(AUTHORIZATION, header)
            .multipart(form)
            .send()
            .await?;
        let uploaded: MediaUploadResponse = check_response(response).await?.json().await?;

        self.signed_post_form(
            UPDATE_URL,
            &[
                ("status", &media.text),
                ("media_ids", &uploaded.media_id_string),
            ],
        )
        .await?;
        Ok(())
    }

    async fn shortener_limits(&self) -> MirrorResult<ShortenerLimits> {
        let response = self
            .signed_get(HELP_CONFIGURATION_URL)
            .await
            .map_err(|e| MirrorError::ConfigFetch(e.to_string()))?;
        let config: HelpConfiguration = response
            .json()
            .await
            .map_err(|e| MirrorError::ConfigFetch(e.to_string()))?;

        Ok(ShortenerLimits {
            short_url_len: config.short_url_length,
            short_url_len_https: config.short_url_length_https,
            media_reserved: config.characters_reserved_per_media,
        })
    }
}
