use crate::activity::{ActivityKind, ClassifiedActivity};
use crate::error::MirrorResult;
use crate::format::truncate::{compose_status, compose_with_url, FIXED_SHORT_URL_LEN, POST_CHAR_LIMIT};
use crate::format::{article_text, require_attachment, NetworkFormatter};
use crate::net::{NetworkClient, PostPayload};
use async_trait::async_trait;

/// App.net formatter: text-only posts under the shared character limit,
/// with a fixed reserved URL width. Photo and video activities fall
/// through to the generic link path.
pub struct AppNetFormatter;

#[async_trait]
impl NetworkFormatter for AppNetFormatter {
    async fn format(
        &self,
        post: &ClassifiedActivity,
        _client: &dyn NetworkClient,
    ) -> MirrorResult<Option<PostPayload>> {
        let payload = match post.kind {
            ActivityKind::Status => Some(PostPayload::Status(compose_status(
                &post.content,
                &post.activity_url,
                POST_CHAR_LIMIT,
                FIXED_SHORT_URL_LEN,
            ))),
            ActivityKind::StatusShare => Some(PostPayload::Status(compose_with_url(
                &post.content,
                &post.activity_url,
                POST_CHAR_LIMIT,
                FIXED_SHORT_URL_LEN,
            ))),
            ActivityKind::Article => {
                let attachment = require_attachment(post)?;
                let text = article_text(&post.content, attachment);
                Some(PostPayload::Status(compose_with_url(
                    &text,
                    &attachment.url,
                    POST_CHAR_LIMIT,
                    FIXED_SHORT_URL_LEN,
                )))
            }
            ActivityKind::Photo | ActivityKind::Video | ActivityKind::Link => {
                post.object_url.as_ref().map(|url| {
                    PostPayload::Status(compose_with_url(
                        &post.content,
                        url,
                        POST_CHAR_LIMIT,
                        FIXED_SHORT_URL_LEN,
                    ))
                })
            }
        };

        Ok(payload)
    }
}
