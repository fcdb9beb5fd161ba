//! Path resolution for codewise configuration files.

use std::path::PathBuf;
use thiserror::Error;

const APP_DIR_NAME: &str = "codewise";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// The platform config directory could not be determined.
    #[error("Cannot find config directory")]
    ConfigDirNotFound,
}

/// Well-known locations of codewise files.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/codewise/
/// ├── config.toml    # model, auth and logging settings
/// └── secret.json    # API keys
/// ```
pub struct CodewisePaths;

impl CodewisePaths {
    /// Returns the codewise configuration directory (e.g. `~/.config/codewise/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }
}
