use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::store::CredentialRecord;

/// A set of tokens returned from a token endpoint after code exchange,
/// refresh, or JWT-bearer grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".into()
}

/// Supplies a currently-valid credential, refreshing it transparently when
/// the implementation knows how.
///
/// Refresh is lazy: it happens inside `token()` when the held record has
/// expired, never on a background task.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<CredentialRecord, AuthError>;
}
