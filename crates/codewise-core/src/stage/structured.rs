use super::outcome::{StageFailure, StageOutcome};
use super::schema::StructuredOutput;
use crate::config::DEFAULT_MODEL_TIMEOUT_SECS;
use crate::model::{ModelClient, ModelError};
use crate::prompt::{PromptRenderer, PromptSpec, PromptVariables};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub const FORMAT_INSTRUCTIONS_SLOT: &str = "format_instructions";

/// One render → invoke → validate unit producing a `T`.
///
/// The stage never retries: a parse failure or an upstream failure is
/// returned to the caller as-is.
pub struct StructuredStage<T> {
    spec: PromptSpec,
    model: Arc<dyn ModelClient>,
    renderer: Arc<PromptRenderer>,
    timeout: Duration,
    _schema: PhantomData<fn() -> T>,
}

impl<T: StructuredOutput> StructuredStage<T> {
    pub fn new(spec: PromptSpec, model: Arc<dyn ModelClient>) -> Self {
        Self {
            spec,
            model,
            renderer: Arc::new(PromptRenderer::new()),
            timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            _schema: PhantomData,
        }
    }

    /// Bounds each model call. Expiry fails the stage with `UpstreamError`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<PromptRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn name(&self) -> &'static str {
        self.spec.name()
    }

    /// Renders the prompt (adding the schema's format instructions), calls the
    /// model and validates the reply as `T`.
    pub async fn execute(&self, mut variables: PromptVariables) -> StageOutcome<T> {
        variables
            .entry(FORMAT_INSTRUCTIONS_SLOT.to_string())
            .or_insert_with(T::format_instructions);

        let prompt = match self.renderer.render(&self.spec, &variables) {
            Ok(prompt) => prompt,
            Err(err) => {
                tracing::error!("[StructuredStage] {} render failed: {}", self.name(), err);
                return StageOutcome::Failure(err.into());
            }
        };

        let schema = T::KIND;
        tracing::debug!(
            stage = self.name(),
            schema = %schema,
            prompt_len = prompt.len(),
            "[StructuredStage] invoking model {}",
            self.model.name()
        );

        let raw = match invoke_model(self.model.as_ref(), &prompt, self.timeout).await {
            Ok(raw) => raw,
            Err(failure) => {
                tracing::warn!("[StructuredStage] {} upstream failure: {}", self.name(), failure);
                return StageOutcome::Failure(failure);
            }
        };

        match T::parse(&raw) {
            Ok(value) => {
                tracing::info!(
                    stage = self.name(),
                    response_len = raw.len(),
                    "[StructuredStage] {} produced a valid {}",
                    self.name(),
                    T::KIND
                );
                StageOutcome::Success(value)
            }
            Err(reason) => {
                tracing::warn!(
                    stage = self.name(),
                    response_len = raw.len(),
                    "[StructuredStage] {} rejected model output: {}",
                    self.name(),
                    reason
                );
                StageOutcome::Failure(StageFailure::parse_error(format!(
                    "{} output rejected: {}",
                    T::KIND,
                    reason
                )))
            }
        }
    }
}

/// Calls the model under a time budget.
pub(crate) async fn invoke_model(
    model: &dyn ModelClient,
    prompt: &str,
    timeout: Duration,
) -> Result<String, StageFailure> {
    match tokio::time::timeout(timeout, model.complete(prompt)).await {
        Ok(Ok(raw)) => Ok(raw),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Err(ModelError::Timeout(timeout).into()),
    }
}
