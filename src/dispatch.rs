use crate::activity::{classify, Activity, ClassifiedActivity};
use crate::error::MirrorResult;
use crate::format::FormatterSet;
use crate::net::{ClientFactory, Network, PostPayload};
use crate::store::{User, UserStore};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Fans one source activity out to every network the user has linked.
///
/// Failures on one network never affect the others: an authorization
/// failure severs that network's link and persists the user, anything
/// else is logged and dropped. There is no retry and no idempotency key;
/// the orchestrator's watermark is the only thing preventing re-delivery.
pub struct Dispatcher {
    factory: Arc<dyn ClientFactory>,
    formatters: FormatterSet,
    store: Arc<dyn UserStore>,
}

impl Dispatcher {
    pub fn new(
        factory: Arc<dyn ClientFactory>,
        formatters: FormatterSet,
        store: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            factory,
            formatters,
            store,
        }
    }

    /// Mirror one activity to all of the user's linked networks.
    /// At most one outbound post per network per invocation.
    pub async fn publish(&self, user: &mut User, activity: &Activity) {
        let post = classify(activity);
        debug!(user = %user.id, activity = %activity.id, kind = ?post.kind, "dispatching activity");

        for network in Network::ALL {
            if !user.account(network).is_linked() {
                continue;
            }

            match self.publish_to(network, user, &post).await {
                Ok(true) => debug!(user = %user.id, %network, "mirrored activity"),
                Ok(false) => {
                    debug!(user = %user.id, %network, "activity has no representation, skipped")
                }
                Err(err) if err.is_auth_revoked() => {
                    warn!(user = %user.id, %network, "authorization revoked, unlinking account");
                    user.account_mut(network).clear();
                    if let Err(err) = self.store.put(user).await {
                        error!(user = %user.id, error = %err, "failed to persist unlinked account");
                    }
                }
                Err(err) => {
                    warn!(user = %user.id, %network, error = %err, "failed to mirror activity")
                }
            }
        }
    }

    async fn publish_to(
        &self,
        network: Network,
        user: &User,
        post: &ClassifiedActivity,
    ) -> MirrorResult<bool> {
        let client = self.factory.client(network, user.account(network));
        let formatter = self.formatters.for_network(network);

        let Some(payload) = formatter.format(post, client.as_ref()).await? else {
            return Ok(false);
        };

        match payload {
            PostPayload::Status(text) => client.post_status(&text).await?,
            PostPayload::Link(link) => client.post_link(&link).await?,
            PostPayload::Media(media) => client.post_media(&media).await?,
        }
        Ok(true)
    }
}
