//! Service-account credentials: RS256-signed JWT assertions exchanged at the
//! key's token endpoint (`urn:ietf:params:oauth:grant-type:jwt-bearer`).
//!
//! The key file is the durable credential, so nothing is written to disk.
//! Minted access tokens are cached in memory until they expire; service
//! accounts get no refresh token, a new assertion is signed instead.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::google::post_token_form;
use super::traits::TokenSource;
use crate::error::AuthError;
use crate::store::CredentialRecord;

pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub const GOOGLE_SA_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for each assertion; Google caps it at one hour.
const ASSERTION_TTL_SECS: i64 = 3600;

/// The subset of a provider-issued service-account key file this crate uses.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_SA_TOKEN_URI.into()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parse key-file JSON. Rejects anything that isn't a service-account key.
    pub fn from_json(content: &[u8]) -> Result<Self, AuthError> {
        let key: ServiceAccountKey = serde_json::from_slice(content)
            .map_err(|e| AuthError::ServiceAccountInvalid(format!("invalid key file: {e}")))?;

        if key.key_type != "service_account" {
            return Err(AuthError::ServiceAccountInvalid(format!(
                "'type' field is {:?}, expected \"service_account\"",
                key.key_type
            )));
        }
        if key.client_email.is_empty() {
            return Err(AuthError::ServiceAccountInvalid("client_email is empty".into()));
        }
        Ok(key)
    }

    /// Read and parse a key file. A missing file is reported as
    /// `ServiceAccountNotFound`, distinct from an unparseable one.
    pub async fn from_file(path: &Path) -> Result<Self, AuthError> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::ServiceAccountNotFound(path.to_path_buf()))
            }
            Err(source) => {
                return Err(AuthError::ServiceAccountRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_json(&content)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Token source minting access tokens through the JWT-bearer grant.
pub struct ServiceAccountSource {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    scopes: Vec<String>,
    http: reqwest::Client,
    cached: Mutex<Option<CredentialRecord>>,
}

impl ServiceAccountSource {
    /// Fails with `ServiceAccountInvalid` when the private key isn't RSA PEM.
    pub fn new(key: ServiceAccountKey, scopes: Vec<String>) -> Result<Self, AuthError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AuthError::ServiceAccountInvalid(format!("private_key: {e}")))?;

        Ok(Self {
            key,
            signing_key,
            scopes,
            http: reqwest::Client::new(),
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Sign a fresh assertion for the configured scopes.
    pub fn assertion(&self) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: self.scopes.join(" "),
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_TTL_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    async fn mint(&self) -> Result<CredentialRecord, AuthError> {
        let assertion = self.assertion()?;
        debug!("Requesting service-account token for {}", self.key.client_email);

        let tokens = post_token_form(
            &self.http,
            &self.key.token_uri,
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())],
        )
        .await?;

        let mut record = CredentialRecord::from_token_set(tokens, Utc::now());
        // Renewal signs a new assertion; a refresh token is never used.
        record.refresh_token.clear();
        Ok(record)
    }
}

#[async_trait]
impl TokenSource for ServiceAccountSource {
    async fn token(&self) -> Result<CredentialRecord, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(record) = cached.as_ref().filter(|r| r.is_valid()) {
            return Ok(record.clone());
        }

        let record = self.mint().await?;
        info!("Minted service-account token for {}", self.key.client_email);
        *cached = Some(record.clone());
        Ok(record)
    }
}
