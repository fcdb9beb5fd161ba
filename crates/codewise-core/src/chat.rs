//! History-aware free-form chat.

use crate::config::DEFAULT_MODEL_TIMEOUT_SECS;
use crate::model::ModelClient;
use crate::prompt::{PromptRenderer, PromptSpec, prompt_vars, templates};
use crate::session::{SessionStore, Turn};
use crate::stage::{StageOutcome, invoke_model};
use std::sync::Arc;
use std::time::Duration;

/// Chat stage: prior turns + new message → model → append on success.
///
/// The reply is free text and is not schema-checked. Both turns are appended
/// only after the model has answered; a failed or cancelled call leaves the
/// session untouched. Exchanges on one session run one at a time, so every
/// reply is generated against the complete preceding history.
pub struct ChatStage {
    store: Arc<SessionStore>,
    model: Arc<dyn ModelClient>,
    renderer: Arc<PromptRenderer>,
    spec: PromptSpec,
    timeout: Duration,
}

impl ChatStage {
    pub fn new(store: Arc<SessionStore>, model: Arc<dyn ModelClient>) -> Self {
        Self {
            store,
            model,
            renderer: Arc::new(PromptRenderer::new()),
            spec: templates::CHAT,
            timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<PromptRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub async fn execute(&self, session_id: &str, user_message: &str) -> StageOutcome<String> {
        let _exchange = self.store.begin_exchange(session_id).await;

        let history = self.store.read(session_id).await;
        let rendered_history = render_history(&history);
        let prompt = match self.renderer.render(
            &self.spec,
            &prompt_vars([
                ("history", rendered_history.as_str()),
                ("input", user_message),
            ]),
        ) {
            Ok(prompt) => prompt,
            Err(err) => {
                tracing::error!("[ChatStage] render failed: {}", err);
                return StageOutcome::Failure(err.into());
            }
        };

        tracing::debug!(
            session_id,
            prior_turns = history.len(),
            "[ChatStage] invoking model {}",
            self.model.name()
        );

        let reply = match invoke_model(self.model.as_ref(), &prompt, self.timeout).await {
            Ok(reply) => reply.trim().to_string(),
            Err(failure) => {
                tracing::warn!(
                    session_id,
                    "[ChatStage] model failed, history unchanged: {}",
                    failure
                );
                return StageOutcome::Failure(failure);
            }
        };

        let (user_seq, assistant_seq) = self
            .store
            .append_exchange(session_id, user_message, reply.clone())
            .await;
        tracing::info!(
            session_id,
            user_seq,
            assistant_seq,
            "[ChatStage] exchange recorded"
        );

        StageOutcome::Success(reply)
    }
}

fn render_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelError;
    use crate::session::TurnRole;
    use crate::stage::FailureKind;
    use crate::testing::ScriptedModel;

    fn chat(model: &Arc<ScriptedModel>) -> ChatStage {
        ChatStage::new(Arc::new(SessionStore::new()), model.clone())
    }

    #[tokio::test]
    async fn test_success_appends_user_then_assistant() {
        let model = Arc::new(ScriptedModel::new().reply("  Hello there!\n"));
        let stage = chat(&model);

        let outcome = stage.execute("alice", "Hi").await;
        assert_eq!(outcome, StageOutcome::Success("Hello there!".to_string()));

        let turns = stage.store().read("alice").await;
        assert_eq!(turns.len(), 2);
        assert_eq!((turns[0].role, turns[0].content.as_str()), (TurnRole::User, "Hi"));
        assert_eq!(
            (turns[1].role, turns[1].content.as_str()),
            (TurnRole::Assistant, "Hello there!")
        );
        assert_eq!(turns[1].sequence_number, 2);
    }

    #[tokio::test]
    async fn test_second_call_sees_prior_history() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply("Nice to meet you, Ada.")
                .reply("Your name is Ada."),
        );
        let stage = chat(&model);

        stage.execute("ada", "My name is Ada").await.ok().unwrap();
        stage.execute("ada", "What is my name?").await.ok().unwrap();

        let prompts = model.prompts();
        assert!(!prompts[0].contains("My name is Ada\nassistant: Nice"));
        assert!(prompts[1].contains("user: My name is Ada\nassistant: Nice to meet you, Ada."));
        assert!(prompts[1].ends_with("user: What is my name?\nassistant:"));
        assert_eq!(stage.store().turn_count("ada").await, 4);
    }

    #[tokio::test]
    async fn test_model_failure_appends_nothing() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply("first answer")
                .fail(ModelError::Http {
                    status: 503,
                    message: "overloaded".into(),
                    retryable: true,
                }),
        );
        let stage = chat(&model);
        stage.execute("alice", "one").await.ok().unwrap();

        let outcome = stage.execute("alice", "two").await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::UpstreamError));
        assert_eq!(stage.store().turn_count("alice").await, 2);
    }

    #[tokio::test]
    async fn test_timeout_appends_nothing() {
        let model = Arc::new(
            ScriptedModel::new()
                .with_latency(Duration::from_secs(5))
                .reply("too late"),
        );
        let stage = chat(&model).with_timeout(Duration::from_millis(20));

        let outcome = stage.execute("alice", "hello?").await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::UpstreamError));
        assert_eq!(stage.store().turn_count("alice").await, 0);
    }

    #[tokio::test]
    async fn test_cancelled_call_appends_nothing() {
        let model = Arc::new(
            ScriptedModel::new()
                .with_latency(Duration::from_secs(5))
                .reply("never delivered"),
        );
        let stage = chat(&model);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(20), stage.execute("alice", "hi")).await;
        assert!(cancelled.is_err());
        assert_eq!(stage.store().turn_count("alice").await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_chats_same_session_do_not_interleave() {
        let mut model = ScriptedModel::new().with_latency(Duration::from_millis(5));
        for i in 0..20 {
            model = model.reply(format!("reply {i}"));
        }
        let model = Arc::new(model);
        let stage = Arc::new(chat(&model));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let stage = stage.clone();
                tokio::spawn(async move { stage.execute("shared", &format!("msg {i}")).await })
            })
            .collect();
        for outcome in futures::future::join_all(handles).await {
            assert!(outcome.unwrap().is_success());
        }

        let turns = stage.store().read("shared").await;
        assert_eq!(turns.len(), 40);
        for (index, pair) in turns.chunks(2).enumerate() {
            assert_eq!(pair[0].role, TurnRole::User);
            assert_eq!(pair[1].role, TurnRole::Assistant);
            assert_eq!(pair[0].sequence_number, index as u64 * 2 + 1);
        }
    }
}
