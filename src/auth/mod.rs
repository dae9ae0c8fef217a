//! Client constructors, one per way of holding a credential.

mod code_flow;
mod prompt;

pub use code_flow::acquire_via_auth_code;
pub use prompt::{CodePrompt, StdinPrompt};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::client::AuthenticatedClient;
use crate::config::{OAuthConfig, DRIVE_SCOPE};
use crate::error::AuthError;
use crate::providers::{
    GoogleOAuth, RefreshTokenSource, ServiceAccountKey, ServiceAccountSource, StaticTokenSource,
};
use crate::store::CredentialRecord;

/// Where the credential for a client comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Token cache file, filled through the authorization-code flow when needed.
    TokenFile(PathBuf),
    /// A raw refresh token; access tokens are minted on first use.
    RefreshToken(String),
    /// A raw access token. It is never refreshed: once it expires requests fail.
    AccessToken(String),
    /// Path to a service-account key file.
    ServiceAccount(PathBuf),
}

impl Credentials {
    /// Build the client for this credential.
    ///
    /// `prompt` is only consulted for `TokenFile` when the cache can't be used.
    pub async fn connect<P>(
        &self,
        config: &OAuthConfig,
        prompt: &P,
    ) -> Result<AuthenticatedClient, AuthError>
    where
        P: CodePrompt + ?Sized,
    {
        match self {
            Credentials::TokenFile(path) => new_file_source_client(config, path, prompt).await,
            Credentials::RefreshToken(token) => Ok(new_refresh_token_client(config, token)),
            Credentials::AccessToken(token) => Ok(new_access_token_client(token)),
            Credentials::ServiceAccount(path) => new_service_account_client(path).await,
        }
    }
}

/// Client backed by a token file; see [`acquire_via_auth_code`].
pub async fn new_file_source_client<P>(
    config: &OAuthConfig,
    token_file: impl AsRef<Path>,
    prompt: &P,
) -> Result<AuthenticatedClient, AuthError>
where
    P: CodePrompt + ?Sized,
{
    acquire_via_auth_code(config, token_file, prompt).await
}

/// Client that redeems `refresh_token` on first use and whenever the access
/// token expires. Touches neither disk nor network until a request is built.
pub fn new_refresh_token_client(config: &OAuthConfig, refresh_token: &str) -> AuthenticatedClient {
    let source = RefreshTokenSource::new(
        GoogleOAuth::new(config.clone()),
        CredentialRecord::from_refresh_token(refresh_token),
    );
    AuthenticatedClient::new(Arc::new(source))
}

/// Client bound to a fixed access token with no way to refresh it.
pub fn new_access_token_client(access_token: &str) -> AuthenticatedClient {
    let source = StaticTokenSource::new(CredentialRecord::from_access_token(access_token));
    AuthenticatedClient::new(Arc::new(source))
}

/// Client authenticated as the service account in `key_file`, scoped to Drive.
pub async fn new_service_account_client(
    key_file: impl AsRef<Path>,
) -> Result<AuthenticatedClient, AuthError> {
    let key = ServiceAccountKey::from_file(key_file.as_ref()).await?;
    let source = ServiceAccountSource::new(key, vec![DRIVE_SCOPE.to_string()])?;
    tracing::debug!("Loaded service account {}", source.client_email());
    Ok(AuthenticatedClient::new(Arc::new(source)))
}
