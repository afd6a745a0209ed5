use crate::activity::{ActivityKind, ClassifiedActivity};
use crate::cache::MediaCache;
use crate::error::{MirrorError, MirrorResult};
use crate::format::truncate::{compose_status, compose_with_url, POST_CHAR_LIMIT};
use crate::format::{article_text, media_filename, require_attachment, NetworkFormatter};
use crate::net::{MediaPost, NetworkClient, PostPayload, ShortenerLimits};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Twitter formatter
///
/// Posts are plain text capped at the network limit, with t.co collapsing
/// any trailing URL to an advertised width. The advertised limits are
/// fetched once through the network client and cached; lookup failure
/// falls back to static defaults and is never fatal.
pub struct TwitterFormatter {
    media: Arc<MediaCache>,
    limits: RwLock<Option<ShortenerLimits>>,
}

impl TwitterFormatter {
    pub fn new(media: Arc<MediaCache>) -> Self {
        Self {
            media,
            limits: RwLock::new(None),
        }
    }

    async fn limits(&self, client: &dyn NetworkClient) -> ShortenerLimits {
        if let Some(limits) = *self.limits.read().await {
            return limits;
        }
        match client.shortener_limits().await {
            Ok(limits) => {
                *self.limits.write().await = Some(limits);
                limits
            }
            Err(err) => {
                warn!(error = %err, "shortener configuration lookup failed, using defaults");
                ShortenerLimits::default()
            }
        }
    }
}

/// Reserved width for one URL, by scheme
fn reserved_for(url: &str, limits: &ShortenerLimits) -> usize {
    if url.starts_with("https:") {
        limits.short_url_len_https
    } else {
        limits.short_url_len
    }
}

#[async_trait]
impl NetworkFormatter for TwitterFormatter {
    async fn format(
        &self,
        post: &ClassifiedActivity,
        client: &dyn NetworkClient,
    ) -> MirrorResult<Option<PostPayload>> {
        let limits = self.limits(client).await;

        let payload = match post.kind {
            ActivityKind::Status => Some(PostPayload::Status(compose_status(
                &post.content,
                &post.activity_url,
                POST_CHAR_LIMIT,
                reserved_for(&post.activity_url, &limits),
            ))),
            // Reshares always anchor the original activity's URL
            ActivityKind::StatusShare => Some(PostPayload::Status(compose_with_url(
                &post.content,
                &post.activity_url,
                POST_CHAR_LIMIT,
                reserved_for(&post.activity_url, &limits),
            ))),
            ActivityKind::Article => {
                let attachment = require_attachment(post)?;
                let text = article_text(&post.content, attachment);
                Some(PostPayload::Status(compose_with_url(
                    &text,
                    &attachment.url,
                    POST_CHAR_LIMIT,
                    reserved_for(&attachment.url, &limits),
                )))
            }
            ActivityKind::Photo => {
                let attachment = require_attachment(post)?;
                let image = attachment.full_image.as_ref().ok_or_else(|| {
                    MirrorError::MalformedActivity(
                        "photo attachment without full image".to_string(),
                    )
                })?;
                let data = self.media.fetch_url(&image.url).await?;

                // The media marker eats into the budget before the caption
                // is measured
                let max = POST_CHAR_LIMIT.saturating_sub(limits.media_reserved + 1);
                let caption = compose_status(
                    &post.content,
                    &post.activity_url,
                    max,
                    reserved_for(&post.activity_url, &limits),
                );
                Some(PostPayload::Media(MediaPost {
                    text: caption,
                    data: data.as_ref().clone(),
                    filename: media_filename(&image.url),
                }))
            }
            // No dedicated handler: generic link against the object itself
            ActivityKind::Video | ActivityKind::Link => post.object_url.as_ref().map(|url| {
                PostPayload::Status(compose_with_url(
                    &post.content,
                    url,
                    POST_CHAR_LIMIT,
                    reserved_for(url, &limits),
                ))
            }),
        };

        Ok(payload)
    }
}
