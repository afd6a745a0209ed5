use serde::{Deserialize, Serialize};

/// One entry of the source activity stream, as the feed API returns it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    /// "post", "share", ...
    pub verb: String,
    pub title: String,
    /// Commentary the user added when resharing
    pub annotation: String,
    pub url: String,
    /// RFC3339 publish timestamp
    pub published: String,
    pub object: Option<ActivityObject>,
}

/// The thing an activity is about (the post body, or the reshared post)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityObject {
    /// Rich-text HTML body
    pub content: String,
    pub url: String,
    /// Original author, present on reshared objects
    pub actor: Option<Actor>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Actor {
    pub display_name: String,
}

/// Media or link attached to an activity object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Attachment {
    /// Type tag: "article", "photo", "video", ...
    pub object_type: String,
    pub url: String,
    pub display_name: String,
    pub full_image: Option<ImageRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageRef {
    pub url: String,
}

/// Feed page wrapper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityFeed {
    pub items: Vec<Activity>,
}

/// Parse an activity's publish time into the nanosecond watermark domain.
/// Returns None for missing or unparsable timestamps.
pub fn published_nanos(activity: &Activity) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(&activity.published)
        .ok()?
        .timestamp_nanos_opt()
}
