/// Target network clients
///
/// One authenticated client per network, all behind the `NetworkClient`
/// seam so the dispatcher never knows which wire API it is talking to.
pub mod appnet;
pub mod facebook;
pub mod oauth1;
pub mod twitter;

pub use appnet::AppNetClient;
pub use facebook::FacebookClient;
pub use twitter::TwitterClient;

use crate::config::AppConfig;
use crate::error::{MirrorError, MirrorResult};
use crate::store::LinkedAccount;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A target network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Twitter,
    Facebook,
    AppNet,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Twitter, Network::Facebook, Network::AppNet];

    pub fn name(&self) -> &'static str {
        match self {
            Network::Twitter => "twitter",
            Network::Facebook => "facebook",
            Network::AppNet => "app.net",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Final postable representation of an activity for one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostPayload {
    /// Plain text body (any trailing URL is already part of the text)
    Status(String),
    /// Native link post
    Link(LinkPost),
    /// Media upload with caption
    Media(MediaPost),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPost {
    pub text: String,
    pub url: String,
    pub image: Option<String>,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct MediaPost {
    pub text: String,
    pub data: Vec<u8>,
    pub filename: String,
}

impl fmt::Debug for MediaPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPost")
            .field("text", &self.text)
            .field("data", &format_args!("{} bytes", self.data.len()))
            .field("filename", &self.filename)
            .finish()
    }
}

/// Character budgets a network's URL shortener advertises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortenerLimits {
    pub short_url_len: usize,
    pub short_url_len_https: usize,
    /// Extra characters reserved when media is attached
    pub media_reserved: usize,
}

impl Default for ShortenerLimits {
    fn default() -> Self {
        Self {
            short_url_len: 24,
            short_url_len_https: 25,
            media_reserved: 25,
        }
    }
}

/// An authenticated client for one network's post APIs.
///
/// Every call returns success or a tagged failure; `AuthRevoked` is the one
/// tag the dispatcher acts on. The default method bodies reject operations
/// a network does not support, so each client only implements its own
/// capabilities.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    fn network(&self) -> Network;

    async fn post_status(&self, text: &str) -> MirrorResult<()>;

    async fn post_link(&self, _link: &LinkPost) -> MirrorResult<()> {
        Err(MirrorError::Internal(format!(
            "{} has no native link posts",
            self.network()
        )))
    }

    async fn post_media(&self, _media: &MediaPost) -> MirrorResult<()> {
        Err(MirrorError::Internal(format!(
            "{} has no media posts",
            self.network()
        )))
    }

    /// Live shortener budget, for networks that publish one
    async fn shortener_limits(&self) -> MirrorResult<ShortenerLimits> {
        Err(MirrorError::ConfigFetch(format!(
            "{} publishes no shortener configuration",
            self.network()
        )))
    }
}

/// Builds an authenticated client for a network from a stored credential
pub trait ClientFactory: Send + Sync {
    fn client(&self, network: Network, account: &LinkedAccount) -> Arc<dyn NetworkClient>;
}

/// Production factory: reqwest-backed clients with a shared, bounded-timeout
/// HTTP transport
pub struct HttpClientFactory {
    config: Arc<AppConfig>,
    http: reqwest::Client,
}

impl HttpClientFactory {
    pub fn new(config: Arc<AppConfig>) -> MirrorResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;

        Ok(Self { config, http })
    }
}

impl ClientFactory for HttpClientFactory {
    fn client(&self, network: Network, account: &LinkedAccount) -> Arc<dyn NetworkClient> {
        match network {
            Network::Twitter => Arc::new(TwitterClient::new(
                self.http.clone(),
                self.config.networks.twitter.clone(),
                account,
            )),
            Network::Facebook => Arc::new(FacebookClient::new(self.http.clone(), account)),
            Network::AppNet => Arc::new(AppNetClient::new(self.http.clone(), account)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_names() {
        assert_eq!(Network::Twitter.to_string(), "twitter");
        assert_eq!(Network::AppNet.to_string(), "app.net");
        assert_eq!(Network::ALL.len(), 3);
    }

    #[test]
    fn test_media_post_debug_hides_bytes() {
        let media = MediaPost {
            text: "caption".to_string(),
            data: vec![0; 4096],
            filename: "x.png".to_string(),
        };
        let debug = format!("{:?}", media);
        assert!(debug.contains("4096 bytes"));
        assert!(!debug.contains("[0"));
    }
}
