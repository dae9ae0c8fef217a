use std::fmt;

/// Google Drive full-access scope.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Out-of-band redirect: the provider shows the code to the user instead of redirecting.
pub const OOB_REDIRECT_URL: &str = "urn:ietf:wg:oauth:2.0:oob";

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";

pub const CLIENT_ID_ENV: &str = "OAUTH_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "OAUTH_CLIENT_SECRET";

/// OAuth client configuration shared by every credential flow.
///
/// Built once at startup and passed into the client constructors.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
}

impl OAuthConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: vec![DRIVE_SCOPE.to_string()],
            redirect_url: OOB_REDIRECT_URL.to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    /// Read the client id and secret from `OAUTH_CLIENT_ID` / `OAUTH_CLIENT_SECRET`.
    ///
    /// Missing or empty values are passed through as empty strings; the
    /// provider rejects them at exchange time.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(CLIENT_ID_ENV).unwrap_or_default(),
            std::env::var(CLIENT_SECRET_ENV).unwrap_or_default(),
        )
    }

    /// Point the authorization and token endpoints somewhere else (e.g. a mock server).
    pub fn with_endpoints(mut self, auth_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("redirect_url", &self.redirect_url)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}
