//! Token sources backing an `AuthenticatedClient`.
//!
//! - `StaticTokenSource`: a fixed access token, no refresh.
//! - `RefreshTokenSource`: refreshes through the provider when expired.
//! - `FileTokenSource`: a `RefreshTokenSource` that writes every new token
//!   back to its token file.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::google::GoogleOAuth;
use super::traits::TokenSource;
use crate::error::AuthError;
use crate::store::{CredentialRecord, TokenStore};

/// Hands out the same record until it expires, then fails.
#[derive(Debug)]
pub struct StaticTokenSource {
    record: CredentialRecord,
}

impl StaticTokenSource {
    pub fn new(record: CredentialRecord) -> Self {
        Self { record }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<CredentialRecord, AuthError> {
        if !self.record.is_valid() {
            return Err(AuthError::TokenExpired);
        }
        Ok(self.record.clone())
    }
}

/// Reuses the current record while valid and redeems its refresh token
/// once it expires.
///
/// The lock is held across the refresh so concurrent callers wait for a
/// single round trip instead of each refreshing.
pub struct RefreshTokenSource {
    provider: GoogleOAuth,
    current: Mutex<CredentialRecord>,
}

impl RefreshTokenSource {
    pub fn new(provider: GoogleOAuth, seed: CredentialRecord) -> Self {
        Self {
            provider,
            current: Mutex::new(seed),
        }
    }
}

#[async_trait]
impl TokenSource for RefreshTokenSource {
    async fn token(&self) -> Result<CredentialRecord, AuthError> {
        let mut current = self.current.lock().await;
        if current.is_valid() {
            return Ok(current.clone());
        }

        if !current.can_refresh() {
            return Err(AuthError::MissingRefreshToken);
        }

        let refreshed = self
            .provider
            .refresh(&current.refresh_token)
            .await
            .map_err(|e| AuthError::RefreshFailed(Box::new(e)))?;

        info!("Access token refreshed (expires {:?})", refreshed.expiry);
        *current = refreshed.clone();
        Ok(refreshed)
    }
}

/// Persists each token handed out by the inner source when it differs from
/// what is already on disk.
pub struct FileTokenSource {
    inner: RefreshTokenSource,
    store: TokenStore,
    saved: Mutex<CredentialRecord>,
}

impl FileTokenSource {
    /// `saved` is the record currently in the token file.
    pub fn new(inner: RefreshTokenSource, store: TokenStore, saved: CredentialRecord) -> Self {
        Self {
            inner,
            store,
            saved: Mutex::new(saved),
        }
    }
}

#[async_trait]
impl TokenSource for FileTokenSource {
    async fn token(&self) -> Result<CredentialRecord, AuthError> {
        let token = self.inner.token().await?;

        let mut saved = self.saved.lock().await;
        if *saved != token {
            // The request can still proceed with the in-memory token.
            match self.store.write(&token).await {
                Ok(()) => {
                    debug!("Persisted refreshed token to {}", self.store.path().display());
                    *saved = token.clone();
                }
                Err(e) => warn!("Failed to persist refreshed token: {e}"),
            }
        }

        Ok(token)
    }
}
