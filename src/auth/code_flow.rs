//! Authorization-code flow with a file-backed token cache.
//!
//! A cached record with a refresh token is used as-is; otherwise the user
//! is sent through the out-of-band consent flow once and the resulting
//! token is saved before the client is handed back.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::prompt::CodePrompt;
use crate::client::AuthenticatedClient;
use crate::config::OAuthConfig;
use crate::error::AuthError;
use crate::providers::{FileTokenSource, GoogleOAuth, RefreshTokenSource};
use crate::store::{CredentialRecord, TokenStore};

/// `state` sent with the consent URL. The out-of-band flow has no redirect
/// to verify it against.
const AUTH_STATE: &str = "state";

/// Build a client from the token file at `token_file`, prompting for an
/// authorization code only when the cache can't refresh silently.
pub async fn acquire_via_auth_code<P>(
    config: &OAuthConfig,
    token_file: impl AsRef<Path>,
    prompt: &P,
) -> Result<AuthenticatedClient, AuthError>
where
    P: CodePrompt + ?Sized,
{
    let store = TokenStore::new(token_file.as_ref());
    let provider = GoogleOAuth::new(config.clone());

    let record = match store.read().await? {
        Some(cached) if cached.can_refresh() => {
            debug!("Using cached token from {}", store.path().display());
            cached
        }
        cached => {
            if cached.is_some() {
                info!("Cached token has no refresh token; re-authorizing");
            } else {
                info!("No cached token; starting authorization");
            }
            let record = authorize(&provider, prompt).await?;
            store.write(&record).await?;
            info!("Saved new token to {}", store.path().display());
            record
        }
    };

    let source = FileTokenSource::new(
        RefreshTokenSource::new(provider, record.clone()),
        store,
        record,
    );
    Ok(AuthenticatedClient::new(Arc::new(source)))
}

/// Run the interactive part: show the consent URL, collect the code, exchange it.
async fn authorize<P>(provider: &GoogleOAuth, prompt: &P) -> Result<CredentialRecord, AuthError>
where
    P: CodePrompt + ?Sized,
{
    let auth_url = provider.auth_code_url(AUTH_STATE)?;
    let code = prompt.authorization_code(&auth_url).await?;

    provider
        .exchange_code(code.trim())
        .await
        .map_err(|e| AuthError::AuthorizationFailed(Box::new(e)))
}
