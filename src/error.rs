use std::path::PathBuf;

/// Unified error type for client construction and token acquisition.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // ── Token Cache Errors ──────────────────────────────────────────────
    #[error("Failed to read token file {path:?}: {source}")]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed token file {path:?}: {source}")]
    CacheParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write token file {path:?}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config Errors ───────────────────────────────────────────────────
    #[error("Invalid OAuth configuration: {0}")]
    InvalidConfig(String),

    // ── Authorization Errors ────────────────────────────────────────────
    #[error("Failed to exchange auth code for token: {0}")]
    AuthorizationFailed(#[source] Box<AuthError>),

    #[error("Failed to read authorization code: {0}")]
    Prompt(String),

    #[error("Token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // ── Token Source Errors ─────────────────────────────────────────────
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[source] Box<AuthError>),

    #[error("Token expired and refresh token is not set")]
    MissingRefreshToken,

    #[error("Token expired")]
    TokenExpired,

    // ── Service Account Errors ──────────────────────────────────────────
    #[error("Service account filename {0:?} not found")]
    ServiceAccountNotFound(PathBuf),

    #[error("Failed to read service account file {path:?}: {source}")]
    ServiceAccountRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid service account key: {0}")]
    ServiceAccountInvalid(String),

    #[error("Failed to sign JWT assertion: {0}")]
    Signing(String),
}

impl AuthError {
    /// True for failures the provider reported about the credential itself
    /// (as opposed to transport failures).
    pub fn is_rejected_by_provider(&self) -> bool {
        match self {
            AuthError::TokenEndpoint { status, .. } => (400..500).contains(status),
            AuthError::AuthorizationFailed(inner) | AuthError::RefreshFailed(inner) => {
                inner.is_rejected_by_provider()
            }
            _ => false,
        }
    }
}
