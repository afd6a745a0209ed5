use crate::activity::model::{Activity, Attachment};
use crate::activity::normalize::strip_markup;

/// Semantic kind of a source activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    /// Plain status update
    Status,
    /// Reshare of someone else's activity
    StatusShare,
    Article,
    Photo,
    Video,
    /// Attachment types without a dedicated handler
    Link,
}

impl ActivityKind {
    /// Map an attachment's type tag onto a kind
    fn from_tag(tag: &str) -> Self {
        match tag {
            "article" => ActivityKind::Article,
            "photo" => ActivityKind::Photo,
            "video" => ActivityKind::Video,
            _ => ActivityKind::Link,
        }
    }
}

/// A source activity resolved into the inputs the formatters need:
/// kind, normalized content and the URLs/attachment to anchor posts on.
#[derive(Debug, Clone)]
pub struct ClassifiedActivity {
    pub kind: ActivityKind,
    /// Plain-text content, markup already stripped
    pub content: String,
    /// First attachment, when one drove the kind
    pub attachment: Option<Attachment>,
    /// URL of the activity itself
    pub activity_url: String,
    /// URL of the activity's object, when an object is present
    pub object_url: Option<String>,
}

/// Determine an activity's kind and content.
///
/// Shares keep the user's annotation, falling back to naming the original
/// author; a share can legitimately arrive without an object, in which case
/// the author name is simply empty. Non-shares default to a status carrying
/// the object content (or the bare title when there is no object), with the
/// first attachment's type tag overriding the kind. Normalization runs
/// once, here, after kind and content are resolved.
pub fn classify(activity: &Activity) -> ClassifiedActivity {
    let object = activity.object.as_ref();

    let mut attachment = None;
    let (kind, content) = if activity.verb == "share" {
        let content = if activity.annotation.is_empty() {
            let author = object
                .and_then(|o| o.actor.as_ref())
                .map(|a| a.display_name.as_str())
                .unwrap_or("");
            format!("Resharing {}", author)
        } else {
            activity.annotation.clone()
        };
        (ActivityKind::StatusShare, content)
    } else if let Some(object) = object {
        let kind = match object.attachments.first() {
            Some(first) => {
                attachment = Some(first.clone());
                ActivityKind::from_tag(&first.object_type)
            }
            None => ActivityKind::Status,
        };
        (kind, object.content.clone())
    } else {
        (ActivityKind::Status, activity.title.clone())
    };

    ClassifiedActivity {
        kind,
        content: strip_markup(&content),
        attachment,
        activity_url: activity.url.clone(),
        object_url: object.map(|o| o.url.clone()),
    }
}
