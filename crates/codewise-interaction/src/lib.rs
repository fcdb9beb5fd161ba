//! Adapters for the services codewise talks to over HTTP.
//!
//! - `chat_completions_client`: [`ChatCompletionsClient`], the OpenAI-compatible model client
//! - `auth_verifier`: [`AuthServiceVerifier`] and [`LocalIdentityVerifier`]

pub mod auth_verifier;
pub mod chat_completions_client;

pub use auth_verifier::{AuthServiceVerifier, LocalIdentityVerifier, verifier_from_settings};
pub use chat_completions_client::ChatCompletionsClient;
