use crate::activity::{ActivityKind, ClassifiedActivity};
use crate::cache::MediaCache;
use crate::error::{MirrorError, MirrorResult};
use crate::format::{media_filename, require_attachment, NetworkFormatter};
use crate::net::{LinkPost, MediaPost, NetworkClient, PostPayload};
use async_trait::async_trait;
use std::sync::Arc;

/// Facebook formatter: no character budget, native link and photo post
/// types instead of URL-in-text composition.
pub struct FacebookFormatter {
    media: Arc<MediaCache>,
}

impl FacebookFormatter {
    pub fn new(media: Arc<MediaCache>) -> Self {
        Self { media }
    }
}

#[async_trait]
impl NetworkFormatter for FacebookFormatter {
    async fn format(
        &self,
        post: &ClassifiedActivity,
        _client: &dyn NetworkClient,
    ) -> MirrorResult<Option<PostPayload>> {
        let payload = match post.kind {
            ActivityKind::Status => Some(PostPayload::Status(post.content.clone())),
            ActivityKind::Photo => {
                let attachment = require_attachment(post)?;
                let image = attachment.full_image.as_ref().ok_or_else(|| {
                    MirrorError::MalformedActivity(
                        "photo attachment without full image".to_string(),
                    )
                })?;
                let data = self.media.fetch_url(&image.url).await?;
                Some(PostPayload::Media(MediaPost {
                    text: post.content.clone(),
                    data: data.as_ref().clone(),
                    filename: media_filename(&image.url),
                }))
            }
            ActivityKind::Article | ActivityKind::Video => {
                let attachment = require_attachment(post)?;
                Some(PostPayload::Link(LinkPost {
                    text: post.content.clone(),
                    url: attachment.url.clone(),
                    image: attachment.full_image.as_ref().map(|i| i.url.clone()),
                }))
            }
            ActivityKind::StatusShare | ActivityKind::Link => {
                post.object_url.as_ref().map(|url| {
                    PostPayload::Link(LinkPost {
                        text: post.content.clone(),
                        url: url.clone(),
                        image: None,
                    })
                })
            }
        };

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Attachment, ImageRef};
    use crate::cache::MediaCacheConfig;
    use crate::config::HttpConfig;
    use crate::net::Network;

    struct StubClient;

    #[async_trait]
    impl NetworkClient for StubClient {
        fn network(&self) -> Network {
            Network::Facebook
        }

        async fn post_status(&self, _text: &str) -> MirrorResult<()> {
            Ok(())
        }
    }

    fn formatter() -> FacebookFormatter {
        let cache = MediaCache::new(
            MediaCacheConfig::default(),
            &HttpConfig {
                timeout_secs: 5,
                user_agent: "test".to_string(),
            },
        )
        .unwrap();
        FacebookFormatter::new(Arc::new(cache))
    }

    fn classified(kind: ActivityKind, content: &str) -> ClassifiedActivity {
        ClassifiedActivity {
            kind,
            content: content.to_string(),
            attachment: None,
            activity_url: "http://plus.example/act".to_string(),
            object_url: Some("http://plus.example/obj".to_string()),
        }
    }

    #[tokio::test]
    async fn test_status_is_never_truncated() {
        let long = "y".repeat(500);
        let payload = formatter()
            .format(&classified(ActivityKind::Status, &long), &StubClient)
            .await
            .unwrap();
        assert_eq!(payload, Some(PostPayload::Status(long)));
    }

    #[tokio::test]
    async fn test_article_becomes_native_link_with_image() {
        let mut post = classified(ActivityKind::Article, "worth reading");
        post.attachment = Some(Attachment {
            object_type: "article".to_string(),
            url: "https://news.example/story".to_string(),
            display_name: "Big Story".to_string(),
            full_image: Some(ImageRef {
                url: "https://news.example/story.jpg".to_string(),
            }),
        });

        let payload = formatter().format(&post, &StubClient).await.unwrap();
        assert_eq!(
            payload,
            Some(PostPayload::Link(LinkPost {
                text: "worth reading".to_string(),
                url: "https://news.example/story".to_string(),
                image: Some("https://news.example/story.jpg".to_string()),
            }))
        );
    }

    #[tokio::test]
    async fn test_share_links_to_object() {
        let payload = formatter()
            .format(&classified(ActivityKind::StatusShare, "look"), &StubClient)
            .await
            .unwrap();
        assert_eq!(
            payload,
            Some(PostPayload::Link(LinkPost {
                text: "look".to_string(),
                url: "http://plus.example/obj".to_string(),
                image: None,
            }))
        );
    }

    #[tokio::test]
    async fn test_photo_uses_media_cache() {
        let formatter = formatter();
        formatter
            .media
            .get_or_fetch("http://img.example/full.jpg", || async { Ok(vec![3, 1]) })
            .await
            .unwrap();

        let mut post = classified(ActivityKind::Photo, "snap");
        post.attachment = Some(Attachment {
            object_type: "photo".to_string(),
            url: "http://img.example".to_string(),
            display_name: String::new(),
            full_image: Some(ImageRef {
                url: "http://img.example/full.jpg".to_string(),
            }),
        });

        let payload = formatter.format(&post, &StubClient).await.unwrap();
        let Some(PostPayload::Media(media)) = payload else {
            panic!("expected a media payload");
        };
        assert_eq!(media.data, vec![3, 1]);
        assert_eq!(media.filename, "full.jpg");
    }
}
