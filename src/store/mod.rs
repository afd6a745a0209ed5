/// User and linked-account persistence
///
/// The mirroring core only needs get/put semantics keyed by user id;
/// the SQLite implementation lives in `users`.
pub mod users;

pub use users::SqliteUserStore;

use crate::error::MirrorResult;
use crate::net::Network;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A user's credential and identity for one target network.
///
/// An account is linked iff the network assigned it an identity; the flag
/// is always recomputed from `network_id`, never stored on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    /// Network-assigned identity (user id on the remote network)
    pub network_id: String,
    /// Display handle on the remote network
    pub screen_name: String,
    pub access_token: String,
    /// Token secret for OAuth1-style networks; empty for bearer tokens
    pub access_secret: String,
}

impl LinkedAccount {
    pub fn is_linked(&self) -> bool {
        !self.network_id.is_empty()
    }

    /// Sever the link. Fields are emptied rather than the record deleted,
    /// so the user row survives until every network is unlinked.
    pub fn clear(&mut self) {
        *self = LinkedAccount::default();
    }
}

/// Credential for the source activity stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAccount {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, nanoseconds since the epoch
    pub token_expiry: i64,
}

/// A mirrored user: source credential, watermark and per-network links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub source: SourceAccount,
    /// Watermark: publish time of the most recently mirrored activity,
    /// nanoseconds since the epoch. Monotonically non-decreasing.
    pub last_synced_at: i64,
    pub twitter: LinkedAccount,
    pub facebook: LinkedAccount,
    pub app_net: LinkedAccount,
    /// Derived: true iff at least one network is linked
    pub active: bool,
}

impl User {
    pub fn account(&self, network: Network) -> &LinkedAccount {
        match network {
            Network::Twitter => &self.twitter,
            Network::Facebook => &self.facebook,
            Network::AppNet => &self.app_net,
        }
    }

    pub fn account_mut(&mut self, network: Network) -> &mut LinkedAccount {
        match network {
            Network::Twitter => &mut self.twitter,
            Network::Facebook => &mut self.facebook,
            Network::AppNet => &mut self.app_net,
        }
    }

    /// Recompute the derived `active` flag from the links
    pub fn recompute_active(&mut self) {
        self.active = Network::ALL.iter().any(|n| self.account(*n).is_linked());
    }
}

/// Persistence seam for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: &str) -> MirrorResult<Option<User>>;

    /// Persist a user. Recomputes `active`; a user transitioning from
    /// inactive to active gets its watermark bumped to "now" so past
    /// activities are not replayed onto a freshly linked network.
    async fn put(&self, user: &mut User) -> MirrorResult<()>;

    /// All users with at least one linked network
    async fn list_active(&self) -> MirrorResult<Vec<User>>;
}
