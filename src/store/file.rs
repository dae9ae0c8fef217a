//! File-backed token store: one serialized `CredentialRecord` per path.
//!
//! A missing file is the normal first-run state, not an error. Writes go
//! to a sibling temp file that is renamed over the target, so a reader
//! never observes a half-written record. There is no locking; concurrent
//! writers to the same path race and the last rename wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::record::CredentialRecord;
use crate::error::AuthError;

/// Token store bound to a single file path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached record. `Ok(None)` when the file does not exist.
    pub async fn read(&self) -> Result<Option<CredentialRecord>, AuthError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No token file at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(AuthError::CacheRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let record = serde_json::from_slice(&content).map_err(|source| AuthError::CacheParse {
            path: self.path.clone(),
            source,
        })?;

        debug!("Loaded token from {}", self.path.display());
        Ok(Some(record))
    }

    /// Replace the file's contents with `record`.
    pub async fn write(&self, record: &CredentialRecord) -> Result<(), AuthError> {
        let write_err = |source| AuthError::CacheWrite {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| write_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &json).await.map_err(write_err)?;
        restrict_permissions(&tmp).await.map_err(write_err)?;

        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }

        debug!("Saved token to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token".into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
