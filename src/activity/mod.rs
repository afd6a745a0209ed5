/// Source activity stream: data model, markup normalization and
/// classification into the kinds the per-network formatters understand.
pub mod classify;
pub mod model;
pub mod normalize;

pub use classify::{classify, ActivityKind, ClassifiedActivity};
pub use model::{published_nanos, Activity, ActivityFeed, ActivityObject, Actor, Attachment, ImageRef};
pub use normalize::strip_markup;
