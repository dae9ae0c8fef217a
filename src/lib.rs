//! OAuth2-authenticated HTTP clients for the Google Drive API.
//!
//! Four ways to get a client, see [`auth::Credentials`]:
//! a token file filled by the out-of-band authorization-code flow, a raw
//! refresh token, a raw access token, or a service-account key file.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod providers;
pub mod store;

pub use auth::{
    acquire_via_auth_code, new_access_token_client, new_file_source_client,
    new_refresh_token_client, new_service_account_client, CodePrompt, Credentials, StdinPrompt,
};
pub use client::AuthenticatedClient;
pub use config::OAuthConfig;
pub use error::AuthError;
pub use store::{CredentialRecord, TokenStore};
