use thiserror::Error;

/// Unified error type for the mirroring service
#[derive(Error, Debug)]
pub enum MirrorError {
    /// The remote network rejected our stored credential; the account link
    /// must be severed
    #[error("authorization revoked by remote network")]
    AuthRevoked,

    /// Transient failure reported by a remote network
    #[error("network error: {0}")]
    Network(String),

    /// HTTP transport errors
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database errors
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Activity missing fields the pipeline needs
    #[error("malformed activity: {0}")]
    MalformedActivity(String),

    /// Remote configuration lookup failed (callers fall back to defaults)
    #[error("configuration fetch failed: {0}")]
    ConfigFetch(String),

    /// Invalid local configuration
    #[error("validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl MirrorError {
    /// True when the remote network reported our credential as revoked,
    /// as opposed to any other kind of failure.
    pub fn is_auth_revoked(&self) -> bool {
        matches!(self, MirrorError::AuthRevoked)
    }
}

/// Result type alias for mirroring operations
pub type MirrorResult<T> = Result<T, MirrorError>;
