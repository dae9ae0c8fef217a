use chrono::Utc;
use tracing::debug;

use super::traits::TokenSet;
use crate::config::OAuthConfig;
use crate::error::AuthError;
use crate::store::CredentialRecord;

/// Google OAuth 2.0 endpoint client for installed applications.
///
/// Builds the consent URL, exchanges authorization codes and redeems
/// refresh tokens. Offline access is always requested so the code
/// exchange yields a refresh token.
#[derive(Debug, Clone)]
pub struct GoogleOAuth {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Build the URL the user must visit to approve access.
    pub fn auth_code_url(&self, state: &str) -> Result<String, AuthError> {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("access_type", "offline"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
        ];

        url::Url::parse_with_params(&self.config.auth_url, &params)
            .map(String::from)
            .map_err(|e| {
                AuthError::InvalidConfig(format!("auth_url {:?}: {e}", self.config.auth_url))
            })
    }

    /// Exchange an authorization code for a fresh credential record.
    pub async fn exchange_code(&self, code: &str) -> Result<CredentialRecord, AuthError> {
        debug!("Exchanging authorization code at {}", self.config.token_url);
        let tokens = post_token_form(
            &self.http,
            &self.config.token_url,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ],
        )
        .await?;

        Ok(CredentialRecord::from_token_set(tokens, Utc::now()))
    }

    /// Mint a new access token from a refresh token.
    ///
    /// Google doesn't always return a new refresh token on refresh; when it
    /// doesn't, the one passed in is carried over.
    pub async fn refresh(&self, refresh_token: &str) -> Result<CredentialRecord, AuthError> {
        debug!("Refreshing access token at {}", self.config.token_url);
        let tokens = post_token_form(
            &self.http,
            &self.config.token_url,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ],
        )
        .await?;

        let mut record = CredentialRecord::from_token_set(tokens, Utc::now());
        if record.refresh_token.is_empty() {
            record.refresh_token = refresh_token.to_string();
        }
        Ok(record)
    }
}

/// POST a form to a token endpoint and decode the standard token response.
pub(crate) async fn post_token_form(
    http: &reqwest::Client,
    token_url: &str,
    form: &[(&str, &str)],
) -> Result<TokenSet, AuthError> {
    let resp = http
        .post(token_url)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(form)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AuthError::TokenEndpoint {
            status: status.as_u16(),
            body,
        });
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| AuthError::TokenEndpoint {
        status: status.as_u16(),
        body: format!("unparseable token response ({e}): {body}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_code_url_requests_offline_access() {
        let google = GoogleOAuth::new(OAuthConfig::new("client-123.apps.example", "secret"));
        let url = url::Url::parse(&google.auth_code_url("state").unwrap()).unwrap();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(url.path(), "/o/oauth2/auth");

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["client_id"], "client-123.apps.example");
        assert_eq!(pairs["redirect_uri"], "urn:ietf:wg:oauth:2.0:oob");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["scope"], "https://www.googleapis.com/auth/drive");
        assert_eq!(pairs["state"], "state");
    }

    #[test]
    fn test_auth_code_url_joins_multiple_scopes() {
        let mut config = OAuthConfig::new("id", "secret");
        config.scopes.push("openid".into());
        let url = url::Url::parse(&GoogleOAuth::new(config).auth_code_url("s").unwrap()).unwrap();
        let scope = url
            .query_pairs()
            .find(|(k, _)| k == "scope")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(scope, "https://www.googleapis.com/auth/drive openid");
    }

    #[test]
    fn test_auth_code_url_rejects_unparseable_auth_url() {
        let config = OAuthConfig::new("id", "secret")
            .with_endpoints("not a url", "https://oauth2.example.test/token");
        let err = GoogleOAuth::new(config).auth_code_url("state").unwrap_err();
        assert!(matches!(err, AuthError::InvalidConfig(_)), "got {err:?}");
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_token_set_defaults_token_type() {
        let tokens: TokenSet = serde_json::from_str(r#"{"access_token":"a","expires_in":60}"#).unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert!(tokens.refresh_token.is_none());
    }
}
