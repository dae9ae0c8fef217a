use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{IntoUrl, Method, RequestBuilder};

use crate::error::AuthError;
use crate::providers::TokenSource;
use crate::store::CredentialRecord;

/// An HTTP client whose requests carry a credential from its token source.
///
/// The token is fetched when a request is built, so an expired token is
/// refreshed lazily right before the request that needs it.
#[derive(Clone)]
pub struct AuthenticatedClient {
    http: reqwest::Client,
    source: Arc<dyn TokenSource>,
}

impl AuthenticatedClient {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self::with_http(reqwest::Client::new(), source)
    }

    /// Use a preconfigured `reqwest::Client` (timeouts, proxies, ...).
    pub fn with_http(http: reqwest::Client, source: Arc<dyn TokenSource>) -> Self {
        Self { http, source }
    }

    /// The credential the next request would carry, refreshing if needed.
    pub async fn token(&self) -> Result<CredentialRecord, AuthError> {
        self.source.token().await
    }

    /// Start a request with the `Authorization` header already set.
    pub async fn request(
        &self,
        method: Method,
        url: impl IntoUrl,
    ) -> Result<RequestBuilder, AuthError> {
        let token = self.source.token().await?;
        Ok(self
            .http
            .request(method, url)
            .header(AUTHORIZATION, token.authorization_header()))
    }

    pub async fn get(&self, url: impl IntoUrl) -> Result<RequestBuilder, AuthError> {
        self.request(Method::GET, url).await
    }

    pub async fn post(&self, url: impl IntoUrl) -> Result<RequestBuilder, AuthError> {
        self.request(Method::POST, url).await
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient").finish_non_exhaustive()
    }
}
