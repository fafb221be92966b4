//! Intent classification and routing.
//!
//! The orchestrator is a one-shot dispatcher: one non-streaming
//! classification call commits the turn to a single agent profile, then
//! delegation is unconditional. There is no retry and no default route; a
//! failed classification fails the whole turn.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::info;

use slidesmith_core::errors::ChatError;
use slidesmith_core::protocol::StreamEvent;

use crate::llm::{ChatMessage, LanguageModel};
use crate::profile::profile_for;
use crate::prompt::{AgentKind, PromptBuilder};
use crate::runner::{run_agent, AgentReply};

/// The committed routing decision for one chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Intent {
    pub kind: AgentKind,
    pub target_slide: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Classification {
    intent: AgentKind,
    #[serde(rename = "targetSlide")]
    target_slide: Option<u32>,
}

fn classifier_prompt(context: &str) -> String {
    format!(
        "You are the Orchestrator of a presentation slide generator.
Your job is to analyze the user's request and route it to the correct specialist agent.

- architect: When the user wants to plan, discuss, or get feedback on presentation structure WITHOUT making changes. (e.g., \"What should I include?\", \"Suggest an outline\", \"Review my deck\")
- writer: When the user wants prose written or rewritten for slides. (e.g., \"Write the content for slide 3\", \"Flesh out the summary\")
- editor: When the user wants to create, modify, add, or delete slides. (e.g., \"Add a slide\", \"Edit slide 2\", \"Make it shorter\", \"Create slides about X\")
- general_chat: When the user asks a general question or greets you.

IMPORTANT: If the user wants to actually CREATE or MODIFY content, use \"editor\" or \"writer\". Use \"architect\" only for planning and feedback discussions.

Answer with a JSON object: {{\"intent\": \"architect|writer|editor|general_chat\", \"targetSlide\": <0-based slide index, only when the request clearly targets one slide>}}.

Current Context:
{context}
"
    )
}

pub struct Orchestrator {
    model: Arc<dyn LanguageModel>,
    prompts: PromptBuilder,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: PromptBuilder) -> Self {
        Self { model, prompts }
    }

    /// Classify the latest user turn. The single answer is authoritative.
    pub async fn route(
        &self,
        history: &[ChatMessage],
        context: &str,
    ) -> Result<Intent, ChatError> {
        let answer = self
            .model
            .complete_json(&classifier_prompt(context), history)
            .await
            .map_err(|error| ChatError::Classification(error.to_string()))?;

        let classification = Classification::deserialize(&answer)
            .map_err(|error| ChatError::Classification(error.to_string()))?;

        let intent =
            Intent { kind: classification.intent, target_slide: classification.target_slide };
        info!(
            event_name = "ai.orchestrator.routed",
            intent = intent.kind.as_str(),
            target_slide = intent.target_slide,
            "intent classified"
        );
        Ok(intent)
    }

    /// Delegate to the bound agent profile, streaming events into `events`.
    pub async fn execute(
        &self,
        intent: Intent,
        history: Vec<ChatMessage>,
        context: &str,
        theme: Option<&str>,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<AgentReply, ChatError> {
        let profile = profile_for(intent.kind);
        let system_prompt =
            self.prompts.build(intent.kind, context, theme, intent.target_slide);

        let reply = run_agent(self.model.as_ref(), &profile, &system_prompt, history, events).await?;
        info!(
            event_name = "ai.orchestrator.completed",
            intent = intent.kind.as_str(),
            reply_chars = reply.text.len(),
            tool_calls = reply.tool_calls.len(),
            "agent turn completed"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    use slidesmith_core::errors::ChatError;

    use super::{Intent, Orchestrator};
    use crate::llm::{ChatMessage, ChunkStream, LanguageModel, LlmError, StepChunk};
    use crate::prompt::{AgentKind, PromptBuilder};

    struct FixedModel {
        classification: Result<Value, String>,
        step_text: Mutex<Option<String>>,
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete_json(
            &self,
            _system: &str,
            _messages: &[ChatMessage],
        ) -> Result<Value, LlmError> {
            self.classification.clone().map_err(LlmError::Request)
        }

        async fn stream_step(
            &self,
            _system: &str,
            _messages: &[ChatMessage],
            _tools: &[Value],
        ) -> Result<ChunkStream, LlmError> {
            let text = self.step_text.lock().unwrap().take().unwrap_or_default();
            let chunks = if text.is_empty() {
                Vec::new()
            } else {
                vec![Ok(StepChunk::TextDelta(text))]
            };
            Ok(Box::pin(futures_util::stream::iter(chunks)))
        }
    }

    fn orchestrator(classification: Result<Value, String>) -> Orchestrator {
        let model = FixedModel {
            classification,
            step_text: Mutex::new(Some("routed".to_string())),
        };
        Orchestrator::new(Arc::new(model), PromptBuilder::new("/nonexistent"))
    }

    #[tokio::test]
    async fn classification_commits_intent_and_target_slide() {
        let orchestrator =
            orchestrator(Ok(json!({ "intent": "editor", "targetSlide": 2 })));
        let intent = orchestrator
            .route(&[ChatMessage::user("edit slide 3")], "A\n---\nB\n---\nC")
            .await
            .expect("classification succeeds");

        assert_eq!(intent, Intent { kind: AgentKind::Editor, target_slide: Some(2) });
    }

    #[tokio::test]
    async fn classification_failure_is_fatal_with_no_default_route() {
        let orchestrator = orchestrator(Err("upstream exploded".to_string()));
        let error = orchestrator
            .route(&[ChatMessage::user("hello")], "# Deck")
            .await
            .expect_err("must fail");

        assert!(matches!(error, ChatError::Classification(_)));
    }

    #[tokio::test]
    async fn unrecognized_intent_label_fails_classification() {
        let orchestrator = orchestrator(Ok(json!({ "intent": "pirate" })));
        let error = orchestrator
            .route(&[ChatMessage::user("arr")], "# Deck")
            .await
            .expect_err("must fail");

        assert!(matches!(error, ChatError::Classification(_)));
    }

    #[tokio::test]
    async fn execute_streams_the_routed_agent_reply() {
        let orchestrator = orchestrator(Ok(json!({ "intent": "general_chat" })));
        let intent = Intent { kind: AgentKind::GeneralChat, target_slide: None };
        let (tx, mut rx) = mpsc::channel(8);

        let reply = orchestrator
            .execute(intent, vec![ChatMessage::user("hi")], "# Deck", None, &tx)
            .await
            .expect("agent runs");
        drop(tx);

        assert_eq!(reply.text, "routed");
        assert!(rx.recv().await.is_some());
    }
}
