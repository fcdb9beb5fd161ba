//! Configuration domain models.
//!
//! These types describe `config.toml` and `secret.json`. Loading them from disk
//! is the infrastructure crate's job; every field has a default so a missing
//! or partial file still yields a usable configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL_NAME: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CLI_USER: &str = "cli_user";

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RootConfig {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Settings for the chat-completions endpoint that backs every stage.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default)]
    pub temperature: f32,
    /// Upper bound for a single model call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model_name: default_model_name(),
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Settings for the identity verifier.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AuthSettings {
    /// Base URL of the remote auth service. When unset, a local verifier
    /// accepting `local_users` is used.
    #[serde(default)]
    pub service_url: Option<String>,
    #[serde(default = "default_local_users")]
    pub local_users: Vec<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            service_url: None,
            local_users: default_local_users(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Contents of `secret.json`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct SecretConfig {
    #[serde(default)]
    pub groq: Option<GroqConfig>,
}

/// Groq (OpenAI-compatible) API credentials.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GroqConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_MODEL_BASE_URL.to_string()
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_MODEL_TIMEOUT_SECS
}

fn default_local_users() -> Vec<String> {
    vec![DEFAULT_CLI_USER.to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}
