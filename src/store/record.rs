use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::TokenSet;

/// Tokens are treated as expired this long before their actual expiry.
pub const EXPIRY_DELTA_SECS: i64 = 10;

/// The persisted credential: what the token file holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    /// `None` means the access token does not expire on its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// A bare bearer access token with no refresh capability.
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".into(),
            ..Default::default()
        }
    }

    /// A record holding only a refresh token, already expired so the first
    /// use mints an access token.
    pub fn from_refresh_token(refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: String::new(),
            token_type: "Bearer".into(),
            refresh_token: refresh_token.into(),
            expiry: Some(Utc::now()),
        }
    }

    /// Convert a token endpoint response, stamping the expiry relative to `now`.
    ///
    /// An `expires_in` too large to represent as a timestamp is stored as no
    /// expiry.
    pub fn from_token_set(tokens: TokenSet, now: DateTime<Utc>) -> Self {
        Self {
            access_token: tokens.access_token,
            token_type: tokens.token_type,
            refresh_token: tokens.refresh_token.unwrap_or_default(),
            expiry: tokens
                .expires_in
                .filter(|secs| *secs > 0)
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(Duration::try_seconds)
                .and_then(|ttl| now.checked_add_signed(ttl)),
        }
    }

    /// An expiry too close to the minimum timestamp to apply the margin to
    /// counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry
                .checked_sub_signed(Duration::seconds(EXPIRY_DELTA_SECS))
                .map_or(true, |deadline| deadline <= now),
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Usable as-is for an outgoing request.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    /// Usable without user interaction: new access tokens can be minted silently.
    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Value for the `Authorization` header. An empty token type means Bearer.
    pub fn authorization_header(&self) -> String {
        let token_type = match self.token_type.as_str() {
            "" => "Bearer",
            // Token endpoints may answer lowercase "bearer".
            t if t.eq_ignore_ascii_case("bearer") => "Bearer",
            t => t,
        };
        format!("{token_type} {}", self.access_token)
    }
}
