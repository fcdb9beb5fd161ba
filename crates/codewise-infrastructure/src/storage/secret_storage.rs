//! Secret configuration file storage.
//!
//! Loads API credentials from ~/.config/codewise/secret.json.

use crate::paths::CodewisePaths;
use codewise_core::config::SecretConfig;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during secret storage operations.
#[derive(Debug, Error)]
pub enum SecretStorageError {
    #[error("Secret file not found at: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not determine config directory")]
    ConfigDirNotFound,
}

/// Read-only access to `secret.json`.
///
/// Does NOT write secrets or validate the keys it returns.
///
/// # Security Note
///
/// The file is plaintext JSON and should be readable by its owner only.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Uses the default path (~/.config/codewise/secret.json).
    pub fn new() -> Result<Self, SecretStorageError> {
        let path =
            CodewisePaths::secret_file().map_err(|_| SecretStorageError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads and parses the secret file.
    ///
    /// # Returns
    ///
    /// - `Err(SecretStorageError::NotFound)`: File doesn't exist
    /// - `Err(SecretStorageError::Parse)`: Invalid JSON format
    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Err(SecretStorageError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&content)?;
        tracing::debug!("[SecretStorage] Loaded secrets from {}", self.path.display());
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields `None`.
    pub fn load_optional(&self) -> Result<Option<SecretConfig>, SecretStorageError> {
        match self.load() {
            Ok(config) => Ok(Some(config)),
            Err(SecretStorageError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
