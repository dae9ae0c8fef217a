//! Token persistence — the credential record and its on-disk file store.

pub mod file;
pub mod record;

pub use file::TokenStore;
pub use record::CredentialRecord;
