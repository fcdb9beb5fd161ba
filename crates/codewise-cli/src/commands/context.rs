use anyhow::{Context, Result};
use codewise_application::AssistantUseCase;
use codewise_core::SessionStore;
use codewise_core::config::RootConfig;
use codewise_interaction::{ChatCompletionsClient, verifier_from_settings};
use std::sync::Arc;
use std::time::Duration;

/// Extra time the REPL allows on top of the per-call model timeout.
const REQUEST_GRACE: Duration = Duration::from_secs(5);

/// Wires the model client, identity verifier and an in-process session store.
pub fn build_assistant(config: &RootConfig) -> Result<AssistantUseCase> {
    let model = ChatCompletionsClient::try_from_env(&config.model)
        .context("Failed to configure the model client")?;
    let verifier = verifier_from_settings(&config.auth)?;

    tracing::info!("[CLI] Using model {}", model.model());
    Ok(AssistantUseCase::new(verifier, Arc::new(model), Arc::new(SessionStore::new()))
        .with_timeout(Duration::from_secs(config.model.timeout_secs)))
}

/// Upper bound for one REPL request.
pub fn request_timeout(config: &RootConfig) -> Duration {
    Duration::from_secs(config.model.timeout_secs) + REQUEST_GRACE
}
