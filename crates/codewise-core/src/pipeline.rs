//! Analyze → generate test → explain pipeline.
//!
//! ```text
//! Start ─analyze─▶ Analyzed ─(not optimal)──────────────────────▶ Done
//!                     │
//!                     └─(optimal)─▶ Tested ─explain─▶ Explained ─▶ Done
//! ```
//!
//! Stages run strictly in sequence because each consumes the previous one's
//! output. Nothing is retried.

use crate::model::ModelClient;
use crate::prompt::{PromptRenderer, prompt_vars, templates};
use crate::stage::{
    CodeAnalysisResult, StageFailure, StageOutcome, StructuredStage, TestExplanationResult,
    TestGenerationResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// Combined output of a pipeline run.
///
/// On a completed run `test_code` and `explanation` are absent exactly when
/// `analysis.is_optimal` is false. A partial run may lack them even though
/// the code was optimal; see [`PipelineOutcome::Partial`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub analysis: CodeAnalysisResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub short_circuited: bool,
}

impl PipelineResult {
    fn analyzed(analysis: CodeAnalysisResult) -> Self {
        Self {
            analysis,
            test_code: None,
            explanation: None,
            short_circuited: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PipelineState {
    Start,
    Analyzed,
    Tested,
    Explained,
    Done,
}

/// How a pipeline run ended.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Every stage that should run did (including a short-circuit).
    Completed(PipelineResult),
    /// Analysis succeeded but a later stage failed. Outputs produced before
    /// the failure are kept.
    Partial {
        result: PipelineResult,
        failure: StageFailure,
    },
    /// Analysis itself failed; no other stage ran.
    Failed(StageFailure),
}

impl PipelineOutcome {
    pub fn result(&self) -> Option<&PipelineResult> {
        match self {
            Self::Completed(result) | Self::Partial { result, .. } => Some(result),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            Self::Completed(_) => None,
            Self::Partial { failure, .. } | Self::Failed(failure) => Some(failure),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Runs the three structured stages with the short-circuit rule.
pub struct PipelineOrchestrator {
    analysis: StructuredStage<CodeAnalysisResult>,
    test_generation: StructuredStage<TestGenerationResult>,
    explanation: StructuredStage<TestExplanationResult>,
}

impl PipelineOrchestrator {
    /// Builds the built-in stages on one model and one shared renderer.
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        let renderer = Arc::new(PromptRenderer::new());
        Self {
            analysis: StructuredStage::new(templates::ANALYSIS, model.clone())
                .with_renderer(renderer.clone()),
            test_generation: StructuredStage::new(templates::TEST_GENERATION, model.clone())
                .with_renderer(renderer.clone()),
            explanation: StructuredStage::new(templates::TEST_EXPLANATION, model)
                .with_renderer(renderer),
        }
    }

    pub fn from_stages(
        analysis: StructuredStage<CodeAnalysisResult>,
        test_generation: StructuredStage<TestGenerationResult>,
        explanation: StructuredStage<TestExplanationResult>,
    ) -> Self {
        Self {
            analysis,
            test_generation,
            explanation,
        }
    }

    /// Applies the same per-call timeout to every stage.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            analysis: self.analysis.with_timeout(timeout),
            test_generation: self.test_generation.with_timeout(timeout),
            explanation: self.explanation.with_timeout(timeout),
        }
    }

    pub async fn analyze(&self, code: &str) -> StageOutcome<CodeAnalysisResult> {
        self.analysis.execute(prompt_vars([("code", code)])).await
    }

    pub async fn generate_test(&self, code: &str) -> StageOutcome<TestGenerationResult> {
        self.test_generation
            .execute(prompt_vars([("code", code)]))
            .await
    }

    pub async fn explain_test(&self, test_code: &str) -> StageOutcome<TestExplanationResult> {
        self.explanation
            .execute(prompt_vars([("test_code", test_code)]))
            .await
    }

    pub async fn run(&self, code: &str) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        self.run_stages(code)
            .instrument(tracing::info_span!("pipeline", %run_id))
            .await
    }

    async fn run_stages(&self, code: &str) -> PipelineOutcome {
        let mut state = PipelineState::Start;
        tracing::debug!(%state, "[Pipeline] starting");

        let analysis = match self.analyze(code).await {
            StageOutcome::Success(analysis) => analysis,
            StageOutcome::Failure(failure) => {
                tracing::warn!(%state, "[Pipeline] analysis failed: {}", failure);
                return PipelineOutcome::Failed(failure);
            }
        };
        state = PipelineState::Analyzed;
        let mut result = PipelineResult::analyzed(analysis);

        if !result.analysis.is_optimal {
            result.short_circuited = true;
            state = PipelineState::Done;
            tracing::info!(
                %state,
                issues = result.analysis.issues.len(),
                "[Pipeline] code not optimal, skipping test generation"
            );
            return PipelineOutcome::Completed(result);
        }

        let test_code = match self.generate_test(code).await {
            StageOutcome::Success(generated) => generated.test_code,
            StageOutcome::Failure(failure) => {
                tracing::warn!(%state, "[Pipeline] test generation failed: {}", failure);
                return PipelineOutcome::Partial { result, failure };
            }
        };
        state = PipelineState::Tested;
        result.test_code = Some(test_code.clone());

        match self.explain_test(&test_code).await {
            StageOutcome::Success(explained) => {
                result.explanation = Some(explained.explanation);
            }
            StageOutcome::Failure(failure) => {
                tracing::warn!(%state, "[Pipeline] explanation failed: {}", failure);
                return PipelineOutcome::Partial { result, failure };
            }
        }
        state = PipelineState::Explained;
        tracing::debug!(%state, "[Pipeline] all stages succeeded");

        state = PipelineState::Done;
        tracing::info!(%state, "[Pipeline] completed");
        PipelineOutcome::Completed(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelError;
    use crate::stage::FailureKind;
    use crate::testing::ScriptedModel;

    const OPTIMAL: &str = r#"{"is_optimal": true, "issues": [], "suggestions": []}"#;
    const NOT_OPTIMAL: &str =
        r#"{"is_optimal": false, "issues": ["Syntax error"], "suggestions": ["Fix syntax"]}"#;
    const TEST_CODE: &str = r#"{"test_code": "def test_f():\n    assert f(1) == 2"}"#;
    const EXPLANATION: &str = r#"{"explanation": "The test calls f with 1."}"#;

    const ANALYSIS_MARKER: &str = "expert Python developer";
    const TEST_GEN_MARKER: &str = "expert QA engineer";
    const EXPLAIN_MARKER: &str = "coding instructor";

    fn orchestrator(model: &Arc<ScriptedModel>) -> PipelineOrchestrator {
        PipelineOrchestrator::new(model.clone())
    }

    #[tokio::test]
    async fn test_not_optimal_short_circuits_without_calling_later_stages() {
        let model = Arc::new(ScriptedModel::new().reply(NOT_OPTIMAL));
        let outcome = orchestrator(&model).run("def f(:").await;

        let PipelineOutcome::Completed(result) = outcome else {
            panic!("expected completed run, got {outcome:?}");
        };
        assert!(result.short_circuited);
        assert!(!result.analysis.is_optimal);
        assert_eq!(result.test_code, None);
        assert_eq!(result.explanation, None);
        assert_eq!(model.call_count(), 1);
        assert_eq!(model.calls_matching(TEST_GEN_MARKER), 0);
        assert_eq!(model.calls_matching(EXPLAIN_MARKER), 0);
    }

    #[tokio::test]
    async fn test_optimal_runs_every_stage_once() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply(OPTIMAL)
                .reply(TEST_CODE)
                .reply(EXPLANATION),
        );
        let outcome = orchestrator(&model).run("def f(x): return x+1").await;

        let PipelineOutcome::Completed(result) = outcome else {
            panic!("expected completed run, got {outcome:?}");
        };
        assert!(result.analysis.is_optimal);
        assert!(!result.short_circuited);
        assert_eq!(
            result.test_code.as_deref(),
            Some("def test_f():\n    assert f(1) == 2")
        );
        assert_eq!(result.explanation.as_deref(), Some("The test calls f with 1."));

        assert_eq!(model.calls_matching(ANALYSIS_MARKER), 1);
        assert_eq!(model.calls_matching(TEST_GEN_MARKER), 1);
        assert_eq!(model.calls_matching(EXPLAIN_MARKER), 1);
    }

    #[tokio::test]
    async fn test_stages_receive_upstream_outputs() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply(OPTIMAL)
                .reply(TEST_CODE)
                .reply(EXPLANATION),
        );
        orchestrator(&model).run("def f(x): return x+1").await.result().unwrap();

        let prompts = model.prompts();
        assert!(prompts[0].contains("def f(x): return x+1"));
        assert!(prompts[1].contains("def f(x): return x+1"));
        assert!(prompts[2].contains("def test_f():\n    assert f(1) == 2"));
    }

    #[tokio::test]
    async fn test_analysis_failure_fails_whole_run() {
        let model = Arc::new(ScriptedModel::new().reply(r#"Sure! {"is_optimal": true}"#));
        let outcome = orchestrator(&model).run("x = 1").await;

        assert!(outcome.result().is_none());
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::ParseError);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_test_generation_failure_keeps_analysis() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply(OPTIMAL)
                .fail(ModelError::Transport("connection reset".into())),
        );
        let outcome = orchestrator(&model).run("def f(x): return x+1").await;

        let PipelineOutcome::Partial { result, failure } = outcome else {
            panic!("expected partial run, got {outcome:?}");
        };
        assert!(result.analysis.is_optimal);
        assert!(!result.short_circuited);
        assert_eq!(result.test_code, None);
        assert_eq!(result.explanation, None);
        assert_eq!(failure.kind, FailureKind::UpstreamError);
        assert_eq!(model.calls_matching(EXPLAIN_MARKER), 0);
    }

    #[tokio::test]
    async fn test_explanation_failure_keeps_generated_test() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply(OPTIMAL)
                .reply(TEST_CODE)
                .reply("Here is the explanation you asked for."),
        );
        let outcome = orchestrator(&model).run("def f(x): return x+1").await;

        let PipelineOutcome::Partial { result, failure } = outcome else {
            panic!("expected partial run, got {outcome:?}");
        };
        assert!(result.test_code.is_some());
        assert_eq!(result.explanation, None);
        assert_eq!(failure.kind, FailureKind::ParseError);
    }

    #[test]
    fn test_result_serialization_omits_absent_fields() {
        let result = PipelineResult {
            analysis: CodeAnalysisResult {
                is_optimal: false,
                issues: vec!["slow".into()],
                suggestions: vec![],
            },
            test_code: None,
            explanation: None,
            short_circuited: true,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("test_code").is_none());
        assert!(value.get("explanation").is_none());
        assert_eq!(value["short_circuited"], true);
    }
}
