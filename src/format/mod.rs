/// Per-network content adaptation
///
/// Each network gets one formatter strategy turning a classified activity
/// into that network's `PostPayload`; `FormatterSet` is the registry the
/// dispatcher looks them up in.
pub mod appnet;
pub mod facebook;
pub mod truncate;
pub mod twitter;

pub use appnet::AppNetFormatter;
pub use facebook::FacebookFormatter;
pub use twitter::TwitterFormatter;

use crate::activity::{Attachment, ClassifiedActivity};
use crate::cache::MediaCache;
use crate::error::{MirrorError, MirrorResult};
use crate::net::{Network, NetworkClient, PostPayload};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns a classified activity into one network's postable payload.
///
/// Returns `Ok(None)` when the activity has no representation on the
/// network (for example a link kind with no object to link to). The client
/// is passed in so formatters can consult network-published configuration
/// under the caller's credentials.
#[async_trait]
pub trait NetworkFormatter: Send + Sync {
    async fn format(
        &self,
        post: &ClassifiedActivity,
        client: &dyn NetworkClient,
    ) -> MirrorResult<Option<PostPayload>>;
}

/// Formatter registry, one strategy per network
pub struct FormatterSet {
    twitter: TwitterFormatter,
    facebook: FacebookFormatter,
    app_net: AppNetFormatter,
}

impl FormatterSet {
    pub fn new(media: Arc<MediaCache>) -> Self {
        Self {
            twitter: TwitterFormatter::new(Arc::clone(&media)),
            facebook: FacebookFormatter::new(media),
            app_net: AppNetFormatter,
        }
    }

    pub fn for_network(&self, network: Network) -> &dyn NetworkFormatter {
        match network {
            Network::Twitter => &self.twitter,
            Network::Facebook => &self.facebook,
            Network::AppNet => &self.app_net,
        }
    }
}

/// Substitute text for link posts whose content is missing or is just the
/// URL itself: the attachment's title, or a fixed fallback.
pub(crate) fn article_text(content: &str, attachment: &Attachment) -> String {
    if content.is_empty() || content == attachment.url {
        if attachment.display_name.is_empty() {
            "Shared a link.".to_string()
        } else {
            attachment.display_name.clone()
        }
    } else {
        content.to_string()
    }
}

/// Filename for a media upload, derived from the source URL's last path
/// segment
pub(crate) fn media_filename(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(|segment| segment.to_string())
        })
        .unwrap_or_else(|| "media".to_string())
}

/// The attachment a kind-specific formatter cannot work without
pub(crate) fn require_attachment(post: &ClassifiedActivity) -> MirrorResult<&Attachment> {
    post.attachment.as_ref().ok_or_else(|| {
        MirrorError::MalformedActivity(format!("{:?} activity without attachment", post.kind))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(url: &str, display_name: &str) -> Attachment {
        Attachment {
            object_type: "article".to_string(),
            url: url.to_string(),
            display_name: display_name.to_string(),
            full_image: None,
        }
    }

    #[test]
    fn test_article_text_keeps_real_content() {
        let att = attachment("https://a.example/story", "A Story");
        assert_eq!(article_text("my take on this", &att), "my take on this");
    }

    #[test]
    fn test_article_text_substitutes_title_for_bare_url() {
        let att = attachment("https://a.example/story", "A Story");
        assert_eq!(article_text("https://a.example/story", &att), "A Story");
        assert_eq!(article_text("", &att), "A Story");
    }

    #[test]
    fn test_article_text_fixed_fallback() {
        let att = attachment("https://a.example/story", "");
        assert_eq!(article_text("", &att), "Shared a link.");
    }

    #[test]
    fn test_media_filename() {
        assert_eq!(media_filename("http://img.example/a/x.png"), "x.png");
        assert_eq!(media_filename("http://img.example/a/x.png?s=640"), "x.png");
        assert_eq!(media_filename("http://img.example/"), "media");
        assert_eq!(media_filename(""), "media");
    }
}
