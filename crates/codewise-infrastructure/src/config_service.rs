//! Configuration service.
//!
//! Loads [`RootConfig`] from `config.toml` (~/.config/codewise/config.toml by
//! default) and layers environment overrides on top.

use crate::paths::CodewisePaths;
use codewise_core::CodewiseError;
use codewise_core::config::RootConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Overrides `model.model_name`.
pub const ENV_MODEL_NAME: &str = "GROQ_MODEL_NAME";
/// Overrides `model.base_url`.
pub const ENV_MODEL_BASE_URL: &str = "CODEWISE_MODEL_BASE_URL";
/// Overrides `auth.service_url`.
pub const ENV_AUTH_SERVICE_URL: &str = "AUTH_SERVICE_URL";

/// Loads and caches the root configuration.
///
/// The file is read lazily on first access. A missing file yields the
/// defaults; an unreadable or malformed file is a configuration error.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Uses the default config path.
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the root configuration, loading it if not cached.
    pub fn get_config(&self) -> Result<RootConfig, CodewiseError> {
        {
            let cached = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let mut loaded = self.load_file()?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn config_path(&self) -> Result<PathBuf, CodewiseError> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => CodewisePaths::config_file().map_err(|e| CodewiseError::config(e.to_string())),
        }
    }

    fn load_file(&self) -> Result<RootConfig, CodewiseError> {
        let path = self.config_path()?;
        load_root_config(&path)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

fn load_root_config(path: &Path) -> Result<RootConfig, CodewiseError> {
    if !path.exists() {
        tracing::debug!(
            "[ConfigService] No config at {}, using defaults",
            path.display()
        );
        return Ok(RootConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!("[ConfigService] Loaded config from {}", path.display());
    Ok(config)
}

/// Applies environment overrides. Empty values are ignored.
pub fn apply_env_overrides(config: &mut RootConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(model_name) = var(ENV_MODEL_NAME) {
        config.model.model_name = model_name;
    }
    if let Some(base_url) = var(ENV_MODEL_BASE_URL) {
        config.model.base_url = base_url;
    }
    if let Some(service_url) = var(ENV_AUTH_SERVICE_URL) {
        config.auth.service_url = Some(service_url);
    }
}
