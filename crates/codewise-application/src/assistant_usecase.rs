//! Assistant use case.
//!
//! Implements the six boundary operations (analyze, generate_test,
//! explain_test, full_pipeline, chat, history). Every operation verifies its
//! token first; nothing reaches the model for a caller that fails
//! verification.

use crate::dto::ChatReply;
use crate::error::AssistantError;
use codewise_core::chat::ChatStage;
use codewise_core::identity::{IdentityVerifier, SessionIdentity, extract_bearer_token};
use codewise_core::model::ModelClient;
use codewise_core::pipeline::{PipelineOrchestrator, PipelineOutcome, PipelineResult};
use codewise_core::session::{HistoryEntry, SessionStore};
use codewise_core::stage::{CodeAnalysisResult, TestExplanationResult, TestGenerationResult};
use std::sync::Arc;
use std::time::Duration;

pub struct AssistantUseCase {
    verifier: Arc<dyn IdentityVerifier>,
    pipeline: PipelineOrchestrator,
    chat: ChatStage,
    store: Arc<SessionStore>,
}

impl AssistantUseCase {
    /// Wires every stage to the same model and the given session store.
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        model: Arc<dyn ModelClient>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            verifier,
            pipeline: PipelineOrchestrator::new(model.clone()),
            chat: ChatStage::new(store.clone(), model),
            store,
        }
    }

    /// Per-call model timeout for every operation.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            pipeline: self.pipeline.with_timeout(timeout),
            chat: self.chat.with_timeout(timeout),
            ..self
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Accepts a raw token or an `Authorization: Bearer ...` value.
    async fn authenticate(&self, token: &str) -> Result<SessionIdentity, AssistantError> {
        let token = extract_bearer_token(token)?;
        match self.verifier.verify(token).await {
            Ok(identity) => Ok(identity),
            Err(err) => {
                tracing::warn!("[AssistantUseCase] authentication failed: {}", err);
                Err(err.into())
            }
        }
    }

    pub async fn analyze(
        &self,
        token: &str,
        code: &str,
    ) -> Result<CodeAnalysisResult, AssistantError> {
        self.authenticate(token).await?;
        Ok(self.pipeline.analyze(code).await.into_result()?)
    }

    pub async fn generate_test(
        &self,
        token: &str,
        code: &str,
    ) -> Result<TestGenerationResult, AssistantError> {
        self.authenticate(token).await?;
        Ok(self.pipeline.generate_test(code).await.into_result()?)
    }

    pub async fn explain_test(
        &self,
        token: &str,
        test_code: &str,
    ) -> Result<TestExplanationResult, AssistantError> {
        self.authenticate(token).await?;
        Ok(self.pipeline.explain_test(test_code).await.into_result()?)
    }

    /// Runs the pipeline. A failure after analysis carries the partial result.
    pub async fn full_pipeline(
        &self,
        token: &str,
        code: &str,
    ) -> Result<PipelineResult, AssistantError> {
        self.authenticate(token).await?;
        match self.pipeline.run(code).await {
            PipelineOutcome::Completed(result) => Ok(result),
            PipelineOutcome::Partial { result, failure } => {
                Err(AssistantError::from(failure).with_partial(result))
            }
            PipelineOutcome::Failed(failure) => Err(failure.into()),
        }
    }

    /// Chats within the caller's own session.
    pub async fn chat(&self, token: &str, message: &str) -> Result<ChatReply, AssistantError> {
        let identity = self.authenticate(token).await?;
        let response = self
            .chat
            .execute(&identity.session_id, message)
            .await
            .into_result()?;
        Ok(ChatReply { response })
    }

    /// The caller's own history, oldest first.
    pub async fn history(&self, token: &str) -> Result<Vec<HistoryEntry>, AssistantError> {
        let identity = self.authenticate(token).await?;
        Ok(self.store.history(&identity.session_id).await)
    }
}
